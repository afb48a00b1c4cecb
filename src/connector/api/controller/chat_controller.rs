use std::io::Write;

use anyhow::{bail, Result};
use futures_util::StreamExt;

use crate::{ChatOptions, ChatReply};

use super::super::Container;

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask(
        &self,
        message: String,
        scenario: String,
        temperature: Option<f32>,
        stream: bool,
    ) -> Result<String> {
        if message.trim().is_empty() {
            bail!("Message cannot be empty");
        }

        let client = self.container.new_client();
        let options = ChatOptions::new()
            .with_scenario(scenario)
            .with_temperature(temperature);

        if !stream {
            let reply = client.chat(&message, &options).await?;
            return Ok(self.format_reply(&options, &reply));
        }

        let mut chunks = client.chat_stream(&message, &options).await?;
        let mut stdout = std::io::stdout();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            write!(stdout, "{}", chunk)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;

        Ok(String::new())
    }

    fn format_reply(&self, options: &ChatOptions, reply: &ChatReply) -> String {
        if reply.fell_back {
            format!(
                "(unknown scenario '{}', answered as '{}')\n{}",
                options.scenario, reply.scenario, reply.content
            )
        } else {
            reply.content.clone()
        }
    }
}
