//! Parsers for the offline model artifacts.
//!
//! Every artifact is a `::`-separated text file, one record per line:
//! - interactions.dat / interactions_weighted.dat: userId::articleId::weight
//! - articles.dat: articleId::categoryId::publisherId::wordsCount::createdAtTs
//! - popularity.dat: articleId::baseScore
//! - embeddings.dat: articleId::v1,v2,...,vd
//! - histories.dat: userId::a1,a2,... (oldest first)
//!
//! Parsers only check syntax. Domain checks (positive weights, uniform
//! embedding dimension, ...) live in the builder so in-memory construction
//! gets the same validation.

use crate::error::{LoadError, Result};
use crate::types::*;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub const INTERACTIONS_FILE: &str = "interactions.dat";
pub const WEIGHTED_INTERACTIONS_FILE: &str = "interactions_weighted.dat";
pub const ARTICLES_FILE: &str = "articles.dat";
pub const POPULARITY_FILE: &str = "popularity.dat";
pub const EMBEDDINGS_FILE: &str = "embeddings.dat";
pub const HISTORIES_FILE: &str = "histories.dat";

/// Walks the `::`-separated fields of one line, producing located errors
struct Fields<'a> {
    file: &'a str,
    line: usize,
    parts: std::str::Split<'a, &'static str>,
}

impl<'a> Fields<'a> {
    fn new(file: &'a str, line: usize, text: &'a str) -> Self {
        Self {
            file,
            line,
            parts: text.split("::"),
        }
    }

    fn error(&self, reason: String) -> LoadError {
        LoadError::Parse {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    fn next_raw(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value.trim()),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    fn next<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.next_raw(name)?;
        raw.parse()
            .map_err(|e| self.error(format!("Invalid {} '{}': {}", name, raw, e)))
    }

    /// Parse a comma-separated list; an empty field yields an empty list
    fn next_list<T>(&mut self, name: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.next_raw(name)?;
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|item| {
                item.parse()
                    .map_err(|e| self.error(format!("Invalid {} entry '{}': {}", name, item, e)))
            })
            .collect()
    }
}

/// Read a file and yield (1-based line number, trimmed non-empty line)
fn read_records(path: &Path) -> Result<Vec<(usize, String)>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse either interaction variant
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    let file = file_label(path);
    let mut interactions = Vec::new();

    for (line_no, line) in read_records(path)? {
        let mut fields = Fields::new(&file, line_no, &line);
        interactions.push(Interaction {
            user_id: fields.next("userId")?,
            article_id: fields.next("articleId")?,
            weight: fields.next("weight")?,
        });
    }

    Ok(interactions)
}

pub fn parse_articles(path: &Path) -> Result<Vec<ArticleMeta>> {
    let file = file_label(path);
    let mut articles = Vec::new();

    for (line_no, line) in read_records(path)? {
        let mut fields = Fields::new(&file, line_no, &line);
        articles.push(ArticleMeta {
            article_id: fields.next("articleId")?,
            category_id: fields.next("categoryId")?,
            publisher_id: fields.next("publisherId")?,
            words_count: fields.next("wordsCount")?,
            created_at_ts: fields.next("createdAtTs")?,
        });
    }

    Ok(articles)
}

pub fn parse_popularity(path: &Path) -> Result<Vec<PopularityEntry>> {
    let file = file_label(path);
    let mut entries = Vec::new();

    for (line_no, line) in read_records(path)? {
        let mut fields = Fields::new(&file, line_no, &line);
        entries.push(PopularityEntry {
            article_id: fields.next("articleId")?,
            base_score: fields.next("baseScore")?,
        });
    }

    Ok(entries)
}

pub fn parse_embeddings(path: &Path) -> Result<Vec<(ArticleId, Vec<f32>)>> {
    let file = file_label(path);
    let mut embeddings = Vec::new();

    for (line_no, line) in read_records(path)? {
        let mut fields = Fields::new(&file, line_no, &line);
        let article_id: ArticleId = fields.next("articleId")?;
        let vector: Vec<f32> = fields.next_list("embedding")?;
        if vector.is_empty() {
            return Err(fields.error(format!("Empty embedding for article {}", article_id)));
        }
        embeddings.push((article_id, vector));
    }

    Ok(embeddings)
}

pub fn parse_histories(path: &Path) -> Result<Vec<(UserId, Vec<ArticleId>)>> {
    let file = file_label(path);
    let mut histories = Vec::new();

    for (line_no, line) in read_records(path)? {
        let mut fields = Fields::new(&file, line_no, &line);
        let user_id: UserId = fields.next("userId")?;
        let articles: Vec<ArticleId> = fields.next_list("articlesRead")?;
        histories.push((user_id, articles));
    }

    Ok(histories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_interactions_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, INTERACTIONS_FILE, "1::10::2\n\n2::11::1.5\n");

        let interactions = parse_interactions(&path).unwrap();
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].article_id, 10);
        assert_eq!(interactions[1].weight, 1.5);
    }

    #[test]
    fn test_parse_articles() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, ARTICLES_FILE, "5::281::3::170::1506942089000\n");

        let articles = parse_articles(&path).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].category_id, 281);
        assert_eq!(articles[0].words_count, 170);
        assert_eq!(articles[0].created_at_ts, 1_506_942_089_000);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, POPULARITY_FILE, "1::0.5\n2::high\n");

        match parse_popularity(&path) {
            Err(LoadError::Parse { file, line, reason }) => {
                assert_eq!(file, POPULARITY_FILE);
                assert_eq!(line, 2);
                assert!(reason.contains("baseScore"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, ARTICLES_FILE, "5::281::3\n");

        let err = parse_articles(&path).unwrap_err();
        assert!(err.to_string().contains("Missing wordsCount"));
    }

    #[test]
    fn test_parse_embeddings_and_histories() {
        let dir = TempDir::new().unwrap();
        let emb = write(&dir, EMBEDDINGS_FILE, "7::0.1, 0.2,0.3\n");
        let hist = write(&dir, HISTORIES_FILE, "1::7,8,9\n2::\n");

        let embeddings = parse_embeddings(&emb).unwrap();
        assert_eq!(embeddings[0], (7, vec![0.1, 0.2, 0.3]));

        let histories = parse_histories(&hist).unwrap();
        assert_eq!(histories[0], (1, vec![7, 8, 9]));
        assert_eq!(histories[1], (2, vec![]));
    }

    #[test]
    fn test_empty_embedding_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, EMBEDDINGS_FILE, "7::\n");
        assert!(parse_embeddings(&path).is_err());
    }
}
