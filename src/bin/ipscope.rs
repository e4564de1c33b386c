use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ipscope::*;
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.ipscope/ipscope.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up information for the current public IP address.
    Current {
        /// Output format
        #[clap(short, long, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Look up information for a specific IPv4 or IPv6 address.
    Lookup {
        /// IP address to look up, e.g. 8.8.8.8 or 2001:4860:4860::8888
        #[clap(name = "ADDRESS")]
        address: String,

        /// Output format
        #[clap(short, long, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the interactive menu.
    Interactive,

    /// Test the API connection and key.
    Test,

    /// Print the current configuration.
    Config,

    /// Run the REST API server.
    Serve {
        /// Address to bind to
        #[clap(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[clap(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    }

    // A missing credential is fatal before any request is attempted
    let config = match IpscopeConfig::new(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Initialization error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Current { format } => {
            let lens = LookupLens::new(GeoClient::new(&config));
            match lens.lookup_current() {
                Ok(report) => print_report(&lens, &report, format),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Lookup { address, format } => {
            let lens = LookupLens::new(GeoClient::new(&config));
            match lens.lookup_address(&address) {
                Ok(report) => print_report(&lens, &report, format),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Interactive => {
            let lens = LookupLens::new(GeoClient::new(&config));
            run_interactive(&lens);
        }
        Commands::Test => {
            let lens = LookupLens::new(GeoClient::new(&config));
            if lens.test_connection() {
                println!("API connection successful");
            } else {
                eprintln!("API connection failed, check your API key and network");
                std::process::exit(1);
            }
        }
        Commands::Config => {
            println!("Config file:        {}", IpscopeConfig::config_file_path());
            println!("{}", config.summary());
        }
        Commands::Serve { host, port } => {
            let state = ServerState::new(LookupLens::new(GeoClient::new(&config)));
            let server_config = ServerConfig::new().with_address(host).with_port(port);

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start async runtime: {e}");
                    std::process::exit(1);
                }
            };
            if let Err(e) = runtime.block_on(start_server(state, server_config)) {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn print_report(lens: &LookupLens, report: &IpReport, format: OutputFormat) {
    match lens.format_report(report, format) {
        Ok(out) => println!("{out}"),
        Err(e) => eprintln!("{e}"),
    }
}

// =============================================================================
// Interactive menu
// =============================================================================

fn run_interactive(lens: &LookupLens) {
    println!("{}", "=".repeat(60));
    println!("{:^60}", "IP ADDRESS INFORMATION");
    println!("{}", "=".repeat(60));

    // single slot holding the most recent successful lookup
    let mut last_report: Option<IpReport> = None;

    loop {
        print_menu();
        let Some(choice) = prompt("Enter your choice (1-6): ") else {
            break;
        };

        match choice.as_str() {
            "1" => {
                println!("Fetching your current IP information...");
                match lens.lookup_current() {
                    Ok(report) => {
                        print_report(lens, &report, OutputFormat::Text);
                        last_report = Some(report);
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            "2" => {
                let Some(address) = prompt("Enter IP address: ") else {
                    break;
                };
                if address.is_empty() {
                    eprintln!("No IP address provided.");
                    continue;
                }
                println!("Fetching information for {address}...");
                match lens.lookup_address(&address) {
                    Ok(report) => {
                        print_report(lens, &report, OutputFormat::Text);
                        last_report = Some(report);
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            "3" => match &last_report {
                Some(report) => print_report(lens, report, OutputFormat::Table),
                None => eprintln!("No data available. Fetch IP information first (1 or 2)."),
            },
            "4" => match &last_report {
                Some(report) => save_menu(report),
                None => eprintln!("No data available. Fetch IP information first (1 or 2)."),
            },
            "5" => {
                println!("Testing API connection...");
                if lens.test_connection() {
                    println!("API connection successful");
                } else {
                    eprintln!("API connection failed, check your API key and network");
                }
            }
            "6" => break,
            _ => eprintln!("Invalid choice. Enter a number between 1 and 6."),
        }
    }

    println!("Goodbye!");
}

fn print_menu() {
    println!();
    println!("1. Get current IP information");
    println!("2. Look up a specific IP address");
    println!("3. Show last result as a table");
    println!("4. Save last result to file");
    println!("5. Test API connection");
    println!("6. Exit");
}

fn save_menu(report: &IpReport) {
    println!("1. Save as JSON");
    println!("2. Save as text");
    println!("3. Save as both");
    let Some(choice) = prompt("Enter choice (1-3): ") else {
        return;
    };

    let Some(basename) = prompt("Enter filename (press Enter for auto-generated): ") else {
        return;
    };
    let base = if basename.is_empty() {
        None
    } else {
        Some(basename)
    };

    let (json, text) = match choice.as_str() {
        "1" => (true, false),
        "2" => (false, true),
        "3" => (true, true),
        _ => {
            eprintln!("Invalid choice.");
            return;
        }
    };

    if json {
        let path = base.as_ref().map(|b| PathBuf::from(format!("{b}.json")));
        match save_json(report, path.as_deref()) {
            Ok(path) => println!("Saved JSON to {}", path.display()),
            Err(e) => eprintln!("{e}"),
        }
    }
    if text {
        let path = base.as_ref().map(|b| PathBuf::from(format!("{b}.txt")));
        match save_text(report, path.as_deref()) {
            Ok(path) => println!("Saved text to {}", path.display()),
            Err(e) => eprintln!("{e}"),
        }
    }
}

/// Prompt on stdout and read one trimmed line; None on EOF or read error
fn prompt(message: &str) -> Option<String> {
    print!("{message}");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}
