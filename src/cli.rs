use std::io::{self, Write};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pcbook::client::LaptopClient;
use pcbook::parser::{self, Command};
use pcbook::{sample, serializer, Filter, Laptop, Memory, MemoryUnit, StatusCode};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Laptop catalog client", long_about = None)]
struct Args {
    /// The server address
    #[clap(long, default_value = "127.0.0.1:8080")]
    address: String,

    /// Create 10 random laptops, run one search and exit
    #[clap(long)]
    demo: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .init();

    let args = Args::parse();
    print_banner();

    let mut client = match LaptopClient::connect(args.address.as_str()).await {
        Ok(client) => {
            println!("[\u{2713}] Connected to pcbook at {}!", args.address);
            client
        }
        Err(e) => {
            println!("[\u{2717}] Could not connect to server at {}: {}", args.address, e);
            println!("    Make sure the server is running ('cargo run --bin pcbook').");
            return Ok(());
        }
    };

    if args.demo {
        return run_demo(&mut client).await;
    }

    println!("Type 'HELP' for supported commands or 'EXIT' to quit.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("pcbook> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else { break };
        if line.trim().is_empty() { continue; }

        match parser::parse_command(&line) {
            Ok(Command::Exit) => break,
            Ok(cmd) => {
                if let Err(e) = execute_command(&mut client, cmd).await {
                    println!("[\u{26a0}\u{fe0f} Error] {}", e);
                }
            }
            Err(e) => {
                println!("[\u{2717} Syntax Error] {}", e);
                if line.trim().to_uppercase().starts_with("SEARCH") {
                    println!("    \u{2139}\u{fe0f}  Hint: Try 'SEARCH PRICE <= 3000 CORES >= 4 GHZ >= 2.5 RAM >= 8 GB'");
                }
            }
        }
    }
    Ok(())
}

fn print_banner() {
    println!("\n==================================================");
    println!("   pcbook CLI - Laptop Catalog");
    println!("==================================================\n");
}

fn print_help() {
    println!("\n--- Available Commands ---");
    println!("1. CREATE:  CREATE [count]                (random sample laptops)");
    println!("2. GET:     GET 'uuid'");
    println!("3. SEARCH:  SEARCH [PRICE <= 3000] [CORES >= 4] [GHZ >= 2.5] [RAM >= 8 GB]");
    println!("4. EXPORT:  EXPORT 'uuid' TO \"laptop.json\" (.json = JSON, else binary)");
    println!("5. IMPORT:  IMPORT FROM \"laptop.bin\"");
    println!("6. EXIT:    Quit\n");
}

async fn execute_command(client: &mut LaptopClient, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Help => print_help(),
        Command::Exit => {}
        Command::Create { count } => {
            for _ in 0..count {
                create_laptop(client, sample::new_laptop()).await?;
            }
        }
        Command::Get { id } => match client.find_laptop(&id.to_string()).await? {
            Some(laptop) => println!("{}", serializer::to_json(&laptop)?),
            None => println!("[\u{2717}] ID Not Found."),
        },
        Command::Search { filter } => search_laptop(client, filter).await?,
        Command::Export { id, path } => match client.find_laptop(&id.to_string()).await? {
            Some(laptop) => {
                serializer::write_file(&laptop, &path)?;
                println!("[\u{2713} OK] Wrote {} to {}", id, path);
            }
            None => println!("[\u{2717}] ID Not Found."),
        },
        Command::Import { path } => {
            let laptop = serializer::read_file(&path)?;
            create_laptop(client, laptop).await?;
        }
    }
    Ok(())
}

async fn create_laptop(client: &mut LaptopClient, laptop: Laptop) -> anyhow::Result<()> {
    match client.create_laptop(laptop).await {
        Ok(id) => println!("[\u{2713} OK] Created laptop with id: {}", id),
        Err(e) if e.code() == Some(StatusCode::AlreadyExists) => println!("[\u{2717}] Laptop already exists."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn search_laptop(client: &mut LaptopClient, filter: Filter) -> anyhow::Result<()> {
    let mut stream = client.search_laptop(filter).await?;
    let mut count = 0;

    println!();
    while let Some(laptop) = stream.next().await? {
        count += 1;
        println!(
            "  \u{2022} {} | {} {} | {} cores @ {:.2} GHz | {} RAM | ${:.2}",
            laptop.id,
            laptop.brand,
            laptop.name,
            laptop.cpu.number_cores,
            laptop.cpu.min_ghz,
            laptop.ram,
            laptop.price_usd,
        );
    }
    println!("Found {} matches.\n", count);
    Ok(())
}

async fn run_demo(client: &mut LaptopClient) -> anyhow::Result<()> {
    for _ in 0..10 {
        create_laptop(client, sample::new_laptop()).await?;
    }

    let filter = Filter {
        max_price_usd: 3000.0,
        min_cpu_cores: 4,
        min_cpu_ghz: 2.5,
        min_ram: Memory::new(8, MemoryUnit::Gigabyte),
    };
    println!("search filter: {:?}", filter);
    search_laptop(client, filter).await
}
