use bcrypt::{hash, DEFAULT_COST};
use std::env;

/// Hash a password for seeding a user row. There is no self-service
/// registration endpoint; users are provisioned operationally.
fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD>");
        std::process::exit(1);
    });

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("{}", hashed);
            println!();
            println!("-- Seed a user with:");
            println!(
                "-- INSERT INTO users (id, email, password_hash, display_name) \
                 VALUES (gen_random_uuid(), 'you@example.com', '{}', 'You');",
                hashed
            );
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
