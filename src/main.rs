use anyhow::bail;
use std::sync::Arc;
use tokenward::application_impl::RealAuthSession;
use tokenward::application_port::AuthSession;
use tokenward::domain_port::{ApiRequest, AuthTransport, SecretStore};
use tokenward::infra_fake::FakeAuthTransport;
use tokenward::infra_file::FileSecretStore;
use tokenward::infra_http::HttpAuthTransport;
use tokenward::infra_jwt::JwtExpiryDecoder;
use tokenward::infra_memory::MemorySecretStore;
use tokenward::logger::*;
use tokenward::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    logger.reload_from_config(&project_settings.log)?;

    let session = build_session(&project_settings).await?;

    match cli.command {
        Command::Login { username, password } => {
            session.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        Command::Status => {
            if session.is_authenticated().await {
                println!("authenticated");
            } else {
                println!("not authenticated");
            }
        }
        Command::Token => {
            let token = session.get_valid_token().await?;
            println!("{}", token.as_str());
        }
        Command::Fetch { url } => {
            let response = session.fetch_with_auth(ApiRequest::get(url)).await?;
            info!(status = response.status, "fetch complete");
            println!("{}", response.text());
        }
    }

    Ok(())
}

async fn build_session(settings: &Settings) -> anyhow::Result<RealAuthSession> {
    let transport: Arc<dyn AuthTransport> = match settings.transport.backend.as_str() {
        "fake" => Arc::new(FakeAuthTransport::new()),
        "http" => Arc::new(HttpAuthTransport::new(settings.http_transport_config())?),
        other => bail!("unknown transport backend: {other:?}"),
    };

    let secrets: Arc<dyn SecretStore> = match settings.storage.backend.as_str() {
        "memory" => Arc::new(MemorySecretStore::new()),
        "file" => Arc::new(FileSecretStore::new(&settings.storage.path)),
        other => bail!("unknown storage backend: {other:?}"),
    };

    let session = RealAuthSession::load(
        transport,
        secrets,
        Arc::new(JwtExpiryDecoder::new()),
        settings.session_config(),
    )
    .await?;
    Ok(session)
}
