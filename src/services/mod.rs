pub mod compositor;
pub mod data_uri;
pub mod generation;
pub mod pipeline;
pub mod poller;
pub mod publisher;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
