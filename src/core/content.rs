use crate::utils::error::{Result, TypefullyError};
use std::io::Read;
use std::path::Path;

/// Typefully splits a draft into separate tweets on four consecutive newlines.
pub const THREAD_SEPARATOR: &str = "\n\n\n\n";

pub const TWEET_CHAR_LIMIT: usize = 280;

/// Where the text of a new draft comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Each part becomes one tweet of the thread.
    Parts(Vec<String>),
    /// A file path, or `-` for standard input.
    File(String),
}

pub fn compose_thread<S: AsRef<str>>(parts: &[S]) -> Result<String> {
    let tweets: Vec<&str> = parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect();

    if tweets.is_empty() {
        return Err(TypefullyError::validation("Draft content cannot be empty"));
    }

    Ok(tweets.join(THREAD_SEPARATOR))
}

pub fn read_content(source: &ContentSource) -> Result<String> {
    match source {
        ContentSource::Parts(parts) => compose_thread(parts),
        ContentSource::File(path) => {
            let raw = if path == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                read_file(Path::new(path))?
            };
            normalize(&raw)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        TypefullyError::IoError(std::io::Error::new(
            e.kind(),
            format!("Cannot read draft file {}: {}", path.display(), e),
        ))
    })
}

/// Files are taken verbatim apart from line endings and surrounding blank space.
pub fn normalize(raw: &str) -> Result<String> {
    let text = raw.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return Err(TypefullyError::validation("Draft content cannot be empty"));
    }
    Ok(text.to_string())
}

pub fn split_thread(content: &str) -> Vec<&str> {
    content
        .split(THREAD_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Zero-based indices of tweets longer than `limit` characters.
pub fn oversized_tweets(content: &str, limit: usize) -> Vec<usize> {
    split_thread(content)
        .iter()
        .enumerate()
        .filter(|(_, tweet)| tweet.chars().count() > limit)
        .map(|(i, _)| i)
        .collect()
}
