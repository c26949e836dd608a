//! Chat node orchestration
//!
//! Wires the sessions into the three runnable modes. In multicast mode the
//! receiver runs as a background task, console input runs on the calling
//! task, and an unbounded channel hands typed lines to a dedicated outbound
//! task so a slow network write never stalls keystroke capture. Components
//! communicate only through channels and the network; there is no shared
//! mutable state beyond the shutdown signals.

use crate::config::ChatConfig;
use crate::console::{classify_line, resolve_username, LineAction, EXIT_SENTINEL};
use crate::error::Result;
use crate::message::clock_stamp;
use crate::multicast::{MulticastReceiver, MulticastSender};
use crate::unicast::{UnicastReceiver, UnicastSender};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Pause between starting the receiver and accepting console input, so the
/// receiver is already listening when the first message goes out
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// One chat participant
///
/// Owns the configuration and a username (prompted for at startup when not
/// preset) and runs one of the transport modes to completion.
///
/// # Examples
///
/// ```no_run
/// use ztalk::{ChatConfig, ChatNode};
///
/// # async fn example() -> ztalk::Result<()> {
/// let node = ChatNode::new(ChatConfig::default()).with_username("Alice");
/// node.run_multicast().await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatNode {
    config: ChatConfig,
    username: Option<String>,
}

impl ChatNode {
    /// Create a node with the given configuration
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            username: None,
        }
    }

    /// Preset the username, skipping the startup prompt
    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The node's configuration
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Run multicast chat until `exit`, end of input, or Ctrl-C
    ///
    /// Starts the receiver in the background, then reads console lines and
    /// hands them to the outbound task. Returns once both sessions have
    /// closed and the final statistics are printed.
    pub async fn run_multicast(&self) -> Result<()> {
        self.config.validate()?;

        print_banner("multicast");
        let mut lines = console_lines();
        let username = self.username_or_prompt(&mut lines).await?;

        println!("Group: {}:{}", self.config.group, self.config.multicast_port);
        println!("User:  {username}");
        println!();

        // Receiver in the background, messages printed as they arrive
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let receiver = Arc::new(MulticastReceiver::new(self.config.clone()));
        let receiver_task = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receiver.run(events_tx).await })
        };
        let printer_task = tokio::spawn(async move {
            while let Some(msg) = events_rx.recv().await {
                println!("{msg}");
            }
        });

        tokio::time::sleep(STARTUP_GRACE).await;

        let sender = match MulticastSender::bind(&self.config).await {
            Ok(sender) => sender,
            Err(e) => {
                receiver.stop();
                let _ = receiver_task.await;
                let _ = printer_task.await;
                return Err(e);
            }
        };

        // Console -> outbound handoff; FIFO, so lines leave in typed order
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let outbound_task = {
            let username = username.clone();
            tokio::spawn(async move {
                while let Some(line) = outbound_rx.recv().await {
                    match sender.send_line(&username, &line).await {
                        Ok(()) => println!("[sent {}] {username}: {line}", clock_stamp()),
                        Err(e) => warn!(error = %e, "multicast send failed"),
                    }
                }
                sender.close();
            })
        };

        println!("Ready. Type your messages ('{EXIT_SENTINEL}' to quit):");
        console_loop(&mut lines, &outbound_tx).await;

        // Orderly teardown: close the handoff, stop the receiver, then
        // report
        drop(outbound_tx);
        receiver.stop();
        let _ = outbound_task.await;
        if let Ok(Err(e)) = receiver_task.await {
            warn!(error = %e, "receiver ended with an error");
        }
        let _ = printer_task.await;

        println!();
        println!("Messages received: {}", receiver.messages_received());
        Ok(())
    }

    /// Run unicast chat sending until `exit`, end of input, or Ctrl-C
    ///
    /// Each typed line fans out to every configured peer. Sends happen
    /// inline; there is no handoff queue in unicast mode.
    pub async fn run_unicast_sender(&self) -> Result<()> {
        print_banner("unicast");
        let mut lines = console_lines();
        let username = self.username_or_prompt(&mut lines).await?;

        let sender = UnicastSender::bind(&self.config).await?;
        println!(
            "Peers: {} on port {}",
            sender.peers().len(),
            self.config.unicast_port
        );
        println!("User:  {username}");
        println!();
        println!("Ready. Type your messages ('{EXIT_SENTINEL}' to quit):");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    info!("interrupt received, shutting down");
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match classify_line(&line) {
                        LineAction::Send(text) => {
                            let delivered = sender.send_line(&username, &text).await;
                            if delivered < sender.peers().len() {
                                warn!(
                                    delivered,
                                    peers = sender.peers().len(),
                                    "some peers were unreachable"
                                );
                            }
                        }
                        LineAction::Skip => {}
                        LineAction::Quit => break,
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "console read failed");
                        break;
                    }
                },
            }
        }

        sender.close();
        Ok(())
    }

    /// Run the unicast receiver until Ctrl-C
    pub async fn run_unicast_receiver(&self) -> Result<()> {
        print_banner("unicast");
        println!("Listening on port {}", self.config.unicast_port);
        println!();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let receiver = Arc::new(UnicastReceiver::new(&self.config));
        let receiver_task = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receiver.run(events_tx).await })
        };
        let printer_task = tokio::spawn(async move {
            while let Some(msg) = events_rx.recv().await {
                println!("{msg}");
            }
        });

        tokio::signal::ctrl_c().await?;
        println!();
        info!("interrupt received, shutting down");

        receiver.stop();
        if let Ok(Err(e)) = receiver_task.await {
            warn!(error = %e, "receiver ended with an error");
        }
        let _ = printer_task.await;

        println!("Messages received: {}", receiver.messages_received());
        Ok(())
    }

    /// Use the preset username or prompt the console for one
    async fn username_or_prompt(&self, lines: &mut Lines<BufReader<Stdin>>) -> Result<String> {
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }

        print!("Enter your username: ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let input = lines.next_line().await?.unwrap_or_default();
        let username = resolve_username(&input);
        if input.trim().is_empty() {
            println!("Using default username: {username}");
        }
        Ok(username)
    }
}

/// Read console lines into the outbound channel until quit or Ctrl-C
async fn console_loop(
    lines: &mut Lines<BufReader<Stdin>>,
    outbound: &mpsc::UnboundedSender<String>,
) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match classify_line(&line) {
                    LineAction::Send(text) => {
                        if outbound.send(text).is_err() {
                            break;
                        }
                    }
                    LineAction::Skip => {}
                    LineAction::Quit => break,
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "console read failed");
                    break;
                }
            },
        }
    }
}

fn console_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn print_banner(mode: &str) {
    println!("=====================================");
    println!("  ztalk {mode} chat");
    println!("=====================================");
    println!();
}
