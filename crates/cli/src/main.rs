mod account;
mod app;
mod args;
mod logger;
mod progress;
mod utils;

use app::App;

#[tokio::main]
async fn main() {
    App::new().run().await;
}
