#![allow(non_snake_case)]

use ServerLibrary::management::server::Server;

#[actix_web::main]
async fn main() {
    Server::run().await;
}
