mod client;

pub use client::{OpenAIClient, OpenAIClientBuilder};
