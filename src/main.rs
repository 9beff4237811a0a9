use clap::Parser;
use thumbsmith::client::GeminiClient;
use thumbsmith::config::{GeminiSettings, narrator_interval, setup_logging};
use thumbsmith::constants::LOADING_MESSAGES;
use thumbsmith::narrator::Narrator;
use thumbsmith::orchestrator::Generator;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = thumbsmith::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let client = match GeminiSettings::from_cli(&cli).and_then(GeminiClient::new) {
        Ok(client) => client,
        Err(err) => {
            error!("Gemini client setup error: {}", err);
            return;
        }
    };
    info!("Using model {}", client.model());

    let narrator = Narrator::new(LOADING_MESSAGES, narrator_interval(&cli));
    let generator = Generator::new(client, narrator);

    if let Err(err) =
        thumbsmith::web::setup_server(&cli.listen_address, cli.port, generator).await
    {
        error!("Application error: {}", err);
    }
}
