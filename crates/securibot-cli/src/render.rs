//! Terminal rendering for messages and notifications.

use colored::Colorize;
use securibot_core::{Message, SecuribotError, Sender};

pub fn print_message(message: &Message) {
    let time = message.timestamp.format("%H:%M");
    match message.sender {
        Sender::User => {
            println!("{}", format!("[{time}] You").green().bold());
            for line in message.text.lines() {
                println!("{}", line.green());
            }
        }
        Sender::Bot if message.is_error => {
            println!("{}", format!("[{time}] Securibot").red().bold());
            for line in message.text.lines() {
                println!("{}", line.red());
            }
        }
        Sender::Bot => {
            println!("{}", format!("[{time}] Securibot").bright_magenta().bold());
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
    println!();
}

pub fn print_transcript(messages: &[Message]) {
    for message in messages.iter().filter(|m| !m.is_loading) {
        print_message(message);
    }
}

/// Prints an error as a user-visible notification.
pub fn notify_error(err: &SecuribotError) {
    eprintln!("{} {}", format!("{}:", err.user_title()).red().bold(), err);
    if err.is_unauthenticated() {
        eprintln!(
            "{}",
            "Run `securibot login --uid <UID> --token <TOKEN>` to sign in.".yellow()
        );
    }
}

pub fn print_suggestions(prompts: &[&str]) {
    if prompts.is_empty() {
        return;
    }
    println!("{}", "Welcome to Securibot!".bright_magenta().bold());
    println!(
        "{}",
        "Ask me anything about cybersecurity, or pick a suggestion with /suggest <n>.".bright_black()
    );
    for (index, prompt) in prompts.iter().enumerate() {
        println!("  {} {}", format!("{}.", index + 1).bright_cyan(), prompt);
    }
    println!();
}
