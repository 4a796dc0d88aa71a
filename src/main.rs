use std::{env, process};

#[tokio::main]
async fn main() {
    if let Err(e) = sql_mail_queue::real_main(env::var("SQL_MAIL_QUEUE_CONFIG").ok()).await {
        eprintln!("{}", e);
        process::exit(1);
    }
}
