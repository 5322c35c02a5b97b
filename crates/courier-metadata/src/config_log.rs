//! Topic Config Log
//!
//! `config.log` records the static topic layout the broker was bootstrapped
//! with, one line per topic:
//!
//! ```text
//! topic_config|topicId|partitionCount
//! ```
//!
//! Bootstrap writes it once; on restart it is the source of truth for the
//! topic set, so a changed configuration file cannot silently re-shape
//! existing on-disk partitions.

use std::path::PathBuf;

use crate::error::{MetadataError, Result};
use crate::fsio::{read_optional, write_atomic};
use crate::types::TopicSpec;

const CONFIG_KEY: &str = "topic_config";

#[derive(Debug)]
pub struct TopicConfigLog {
    path: PathBuf,
}

impl TopicConfigLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(read_optional(&self.path).await?.is_some())
    }

    /// Read the topic layout. Malformed lines are fatal.
    pub async fn read(&self) -> Result<Vec<TopicSpec>> {
        let text = read_optional(&self.path).await?.ok_or_else(|| {
            MetadataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config log missing: {}", self.path.display()),
            ))
        })?;

        let mut topics = Vec::new();
        for line in text.lines().filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('|').collect();
            let malformed = || MetadataError::MalformedLine {
                file: self.path.display().to_string(),
                line: line.to_string(),
            };

            if parts.len() != 3 || parts[0] != CONFIG_KEY || parts[1].is_empty() {
                return Err(malformed());
            }
            let partitions: u32 = parts[2].parse().map_err(|_| malformed())?;
            if partitions == 0 {
                return Err(malformed());
            }

            topics.push(TopicSpec {
                id: parts[1].to_string(),
                partitions,
            });
        }
        Ok(topics)
    }

    pub async fn write(&self, topics: &[TopicSpec]) -> Result<()> {
        let mut contents = String::new();
        for topic in topics {
            contents.push_str(&format!(
                "{CONFIG_KEY}|{}|{}\n",
                topic.id, topic.partitions
            ));
        }
        write_atomic(&self.path, &contents).await?;
        Ok(())
    }
}
