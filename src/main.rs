use anyhow::Result;
use env_logger::Env;
use shogi_salmon::usi::UsiHandler;

fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut usi = UsiHandler::new();
    usi.run()
}
