use review_desk_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("review desk error: {err}");
        std::process::exit(1);
    }
}
