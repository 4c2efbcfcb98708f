/// Use mimalloc as the global allocator.
/// Every file gets its own thread and read buffer, so allocation happens on
/// many threads at once; mimalloc's thread-local caching keeps that cheap.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod crc;
pub mod fanout;
