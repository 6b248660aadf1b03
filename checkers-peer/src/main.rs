use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkers_peer::cli::{Cli, Command};
use checkers_peer::input::{help_text, parse_command};
use checkers_peer::{
    run_session, DriverEvent, NetworkConnector, PeerConfig, Role, Session, SessionEvent,
    SimulatedWorld, StorageManager,
};
use protocol::MatchEnd;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("checkers_peer=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config();

    match &cli.command {
        Command::Host { .. } => play(Role::Host, &config).await,
        Command::Join { .. } => play(Role::Join, &config).await,
        Command::Records => list_records(),
        Command::Show { record_id } => show_record(record_id),
    }
}

async fn play(role: Role, config: &PeerConfig) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();

    let addr = match role {
        Role::Host => config.listen_addr.clone(),
        Role::Join => config.host_addr.clone(),
    };
    let connector = NetworkConnector::new(role, addr, tx.clone());
    let world = SimulatedWorld::new(tx.clone(), config.world_report_interval());
    let session = match role {
        Role::Host => Session::host(connector, world, config.greeting.clone()),
        Role::Join => Session::join(connector, world),
    };

    info!("以 {} 身份启动，执 {}", role, role.side());
    println!("{}", help_text());

    tx.send(DriverEvent::Session(SessionEvent::Activated))?;
    tokio::spawn(read_commands(tx));

    let record = run_session(session, rx).await;

    match record.metadata.end {
        Some(MatchEnd::Win(side)) => println!("{} won after {} plies", side, record.plies.len()),
        Some(MatchEnd::Disconnected) => println!("Match aborted: peer disconnected"),
        None => println!("Match left unfinished"),
    }

    if config.save_records && !record.plies.is_empty() {
        let storage = StorageManager::new()?;
        let record_id = storage.save_record(&record)?;
        println!("Record saved: {}", record_id);
    }

    Ok(())
}

/// 读取控制台命令，输入结束时退出
async fn read_commands(events: mpsc::UnboundedSender<DriverEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Ok(Some(event)) => {
                if events.send(event).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}\n{}", e, help_text()),
        }
    }
    let _ = events.send(DriverEvent::Quit);
}

fn list_records() -> Result<()> {
    let storage = StorageManager::new()?;
    let records = storage.list_records()?;
    if records.is_empty() {
        println!("No records in {:?}", storage.records_directory());
        return Ok(());
    }

    for info in records {
        let end = match info.end {
            Some(MatchEnd::Win(side)) => format!("{} won", side),
            Some(MatchEnd::Disconnected) => "disconnected".to_string(),
            None => "unfinished".to_string(),
        };
        println!(
            "{}  {}  as {}  {} plies  {}",
            info.record_id,
            info.started_at.format("%Y-%m-%d %H:%M:%S"),
            info.local_side,
            info.ply_count,
            end
        );
    }
    Ok(())
}

fn show_record(record_id: &str) -> Result<()> {
    let storage = StorageManager::new()?;
    let record = storage.load_record(record_id)?;

    println!(
        "started {}  as {}",
        record.metadata.started_at.format("%Y-%m-%d %H:%M:%S"),
        record.metadata.local_side
    );
    for (n, ply) in record.plies.iter().enumerate() {
        let (Some(from), Some(to)) = (ply.from_position(), ply.to_position()) else {
            println!("{:>3}. {} <invalid position>", n + 1, ply.side);
            continue;
        };
        let captures = if ply.captured.is_empty() {
            String::new()
        } else {
            format!("  x{}", ply.captured.len())
        };
        println!("{:>3}. {} {} -> {}{}", n + 1, ply.side, from, to, captures);
    }
    Ok(())
}
