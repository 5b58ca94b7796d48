//! Prompt Agent - one-shot prompt runner for a local inference server
//!
//! This is the CLI entry point for the prompt-agent tool.
//! Run with: cargo run --bin prompt-agent -- "your prompt"

use ollama_prompt_agent::{AppSettings, ResponseAgent, ResultRecord};
use std::env;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    // Saved settings first, environment on top
    let mut settings = AppSettings::load();
    settings.apply_env();

    if args.iter().any(|arg| arg == "--save-settings") {
        match settings.save() {
            Ok(path) => println!("Settings saved to {}", path.display()),
            Err(e) => eprintln!("❌ {}", e),
        }
        return Ok(());
    }

    let agent = ResponseAgent::new(settings.model_config(), settings.agent_config())?;
    let model_config = agent.client().config();
    let agent_config = agent.config();

    println!("🤖 Prompt Agent");
    println!("================================================");
    println!("Model: {} @ {}", model_config.model_name, model_config.base_url);
    println!(
        "Retry: max {} attempts, {}s delay, {}s timeout",
        model_config.max_retries,
        model_config.retry_delay.as_secs(),
        model_config.request_timeout.as_secs()
    );
    match agent_config.max_wait {
        Some(limit) => {
            println!(
                "Agent: {} attempts, {}s max wait",
                agent_config.retry_count,
                limit.as_secs()
            );
        }
        None => println!("Agent: {} attempts, no max wait", agent_config.retry_count),
    }
    println!("Output: {}", settings.output_path);
    println!("================================================\n");

    if !args.is_empty() {
        let prompt = args.join(" ");
        run_prompt(&agent, &prompt, &settings.output_path).await;
        return Ok(());
    }

    // Interactive mode
    println!("Interactive mode. Type your prompt and press Enter.");
    println!("Type 'quit' or 'exit' to exit.\n");

    let stdin = io::stdin();
    loop {
        print!("📝 Prompt: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let prompt = line.trim();

        if prompt == "quit" || prompt == "exit" {
            println!("Goodbye! 👋");
            break;
        }

        run_prompt(&agent, prompt, &settings.output_path).await;
    }

    Ok(())
}

/// Generate, persist, reload and display one record.
async fn run_prompt(agent: &ResponseAgent, prompt: &str, output_path: &str) {
    let record = agent.generate_response(prompt).await;

    if let Err(e) = record.save(output_path) {
        eprintln!("\n⚠️ Could not save result: {}", e);
        print_record(&record);
        return;
    }

    match ResultRecord::load(output_path) {
        Ok(saved) => print_record(&saved),
        Err(e) => {
            eprintln!("\n⚠️ Could not reload result: {}", e);
            print_record(&record);
        }
    }
}

fn print_record(record: &ResultRecord) {
    if record.error {
        eprintln!("\n❌ {}", record.text);
    } else {
        println!("\n✅ Response:\n{}", record.text);
    }
    println!(
        "\n⏱️ {:.2}s (error: {})\n",
        record.processing_time, record.error
    );
}
