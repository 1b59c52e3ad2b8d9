pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        store_url: String,
        max_fails: i64,
        lock_seconds: u64,
    },
}
