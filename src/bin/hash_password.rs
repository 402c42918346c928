//! Prints a bcrypt hash for seeding `empleado.contrasena` by hand.

use anyhow::Result;
use clap::Parser;
use raices_orderservice::auth::passwords;

#[derive(Debug, Parser)]
#[command(about = "Hash a staff password with bcrypt")]
struct Args {
    /// Plain-text password to hash
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let hashed = passwords::hash_password(args.password).await?;
    println!("{hashed}");

    Ok(())
}
