#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    // `.env` must be loaded before Rocket reads its figment.
    dotenvy::dotenv().ok();

    let _rocket = todo_api::rocket().launch().await?;

    Ok(())
}
