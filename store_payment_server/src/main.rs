use clap::Parser;
use dotenvy::dotenv;
use log::info;
use store_payment_server::{
    cli::{display_envs, print_token, seed_admin, Arguments, Command},
    config::ServerConfig,
    server::run_server,
};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    let command = args.command.unwrap_or(Command::Serve);
    if let Command::Env = command {
        display_envs();
        return;
    }
    let config = ServerConfig::from_env_or_default();
    let result = match command {
        Command::SeedAdmin { username } => seed_admin(&config, username).await,
        Command::Token { username, hours } => print_token(&config, &username, hours).await,
        _ => {
            info!("🚀️ Starting server on {}:{}", config.host, config.port);
            run_server(config).await.map(|_| println!("Bye!"))
        },
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
