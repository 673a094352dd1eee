//! Group Chat Client
//!
//! Usage: group-chat-client <server host> <server port>
//!
//! Sends each line typed on stdin to the server and prints every line the
//! server sends back. Exits after `/quit` or when the server hangs up.

use log::debug;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 2 {
        eprintln!("Usage: group-chat-client <server host> <server port>");
        return ExitCode::from(2);
    }

    let port: u16 = match args[1].parse() {
        Ok(port) => port,
        Err(_) => {
            eprintln!("Invalid port: {}", args[1]);
            return ExitCode::from(2);
        }
    };

    match run(&args[0], port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Client error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(host: &str, port: u16) -> std::io::Result<()> {
    let stream = TcpStream::connect((host, port)).await?;
    println!("Connected to the server. Type your messages.");

    let (read_half, mut write_half) = stream.into_split();

    let mut server_lines = BufReader::new(read_half).lines();
    let mut listener = tokio::spawn(async move {
        loop {
            match server_lines.next_line().await {
                Ok(Some(line)) => println!("Server: {}", line),
                Ok(None) => break,
                Err(e) => {
                    debug!("Read from server failed: {}", e);
                    break;
                }
            }
        }
        println!("Server connection closed.");
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut server_closed = false;
    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                write_half.write_all(line.as_bytes()).await?;
                write_half.write_all(b"\n").await?;
                write_half.flush().await?;
                if line.trim().eq_ignore_ascii_case("/quit") {
                    break;
                }
            }
            _ = &mut listener => {
                server_closed = true;
                break;
            }
        }
    }

    if !server_closed {
        write_half.shutdown().await?;
        let _ = listener.await;
    }
    println!("Client resources closed.");
    Ok(())
}
