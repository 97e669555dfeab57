use mailgate::config::MailerConfig;
use mailgate::dispatch::MailDispatcher;
use mailgate::message::EmailMessage;

use std::env;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Get recipient from command line argument
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <recipient_email>", args[0]);
        std::process::exit(1);
    }
    let recipient = &args[1];

    let config = MailerConfig::from_env()?;
    let dispatcher = MailDispatcher::from_config(&config)?;

    let message = EmailMessage::html(
        recipient,
        "Mailgate test message",
        "<p>This is a test message sent through mailgate.</p>",
    );

    // Send the email
    let receipt = dispatcher.send(&message).await?;
    println!("📧 Accepted by {} transport: {}", dispatcher.transport_kind(), receipt.detail);

    Ok(())
}
