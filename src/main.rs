use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};

use rust_chat_client::{ChatEvent, ChatSession, Sender, config};

#[derive(Parser)]
#[command(
    name = "rust_chat_client",
    version,
    about = "Resilient realtime chat client with an HTTP fallback"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    let mut session = ChatSession::spawn(&app_config);
    println!("Chat client ready. Type a message; /clear resets, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let input = line.trim();
                        if input.is_empty() {
                            continue;
                        }
                        match input {
                            "/quit" => break,
                            "/clear" => {
                                session.clear_messages();
                                println!("(history cleared)");
                            }
                            _ => {
                                session.send_message(input).await;
                                // A fallback reply is appended synchronously;
                                // a realtime reply arrives later as an event.
                                if let Some(reply) = session
                                    .messages()
                                    .last()
                                    .filter(|m| m.sender == Sender::Bot)
                                {
                                    println!("bot> {}", reply.content);
                                }
                                if let Some(error) = session.error() {
                                    eprintln!("error: {error}");
                                }
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        log::error!("stdin read failed: {err}");
                        break;
                    }
                }
            }
            event = session.recv_event() => {
                match event {
                    Some(ChatEvent::MessageReceived(message)) => {
                        println!("bot> {}", message.content);
                    }
                    Some(ChatEvent::Connected) => log::info!("Chat channel ready"),
                    Some(ChatEvent::Reconnecting) => {
                        eprintln!("(connection lost; reconnecting...)");
                    }
                    Some(ChatEvent::Unavailable) => {
                        eprintln!("(chat service unavailable; replies go through the fallback)");
                    }
                    None => break,
                }
            }
        }
    }

    session.close().await;
}
