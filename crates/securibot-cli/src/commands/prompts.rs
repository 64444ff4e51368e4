use colored::Colorize;
use securibot_core::prompts::suggested_prompts;

pub fn print() {
    println!("{}", "Suggested prompts:".bold());
    for (index, prompt) in suggested_prompts().iter().enumerate() {
        println!("  {} {}", format!("{}.", index + 1).bright_cyan(), prompt);
    }
}
