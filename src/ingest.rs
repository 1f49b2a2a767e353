//! Course document parsing and sentence-based chunking.
//!
//! A course document starts with header lines
//!
//! ```text
//! Course Title: Building Towards Computer Use
//! Course Link: https://example.com/course
//! Course Instructor: Colt Steele
//! ```
//!
//! followed by `Lesson N: Title` markers, each optionally followed by a
//! `Lesson Link: URL` line and then the lesson body.

use crate::error::{CoursemateError, Result};
use crate::models::{Course, CourseChunk, Lesson};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Parses course documents into course metadata and content chunks.
pub struct CourseDocumentParser {
    chunk_size: usize,
    chunk_overlap: usize,
    title_re: Regex,
    link_re: Regex,
    instructor_re: Regex,
    lesson_re: Regex,
    lesson_link_re: Regex,
}

impl CourseDocumentParser {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CoursemateError::Ingestion(format!("bad pattern: {}", e)))
        };

        Ok(Self {
            chunk_size,
            chunk_overlap,
            title_re: compile(r"(?i)^course title:\s*(.+)$")?,
            link_re: compile(r"(?i)^course link:\s*(.+)$")?,
            instructor_re: compile(r"(?i)^course instructor:\s*(.+)$")?,
            lesson_re: compile(r"(?i)^lesson\s+(\d+):\s*(.+)$")?,
            lesson_link_re: compile(r"(?i)^lesson link:\s*(.+)$")?,
        })
    }

    /// Parse document text; `fallback_title` names the course when no title line exists.
    pub fn parse(&self, text: &str, fallback_title: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let mut course = Course {
            title: fallback_title.to_string(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        };

        let mut lines = text.lines().map(str::trim).peekable();

        // Header lines come first, in any order, until the first other line.
        while let Some(&line) = lines.peek() {
            if line.is_empty() {
                lines.next();
                continue;
            }
            if let Some(caps) = self.title_re.captures(line) {
                course.title = caps[1].trim().to_string();
            } else if let Some(caps) = self.link_re.captures(line) {
                course.course_link = Some(caps[1].trim().to_string());
            } else if let Some(caps) = self.instructor_re.captures(line) {
                course.instructor = Some(caps[1].trim().to_string());
            } else {
                break;
            }
            lines.next();
        }

        if course.title.trim().is_empty() {
            return Err(CoursemateError::Ingestion("course has no title".to_string()));
        }

        let mut sections: Vec<(Option<u32>, Vec<&str>)> = Vec::new();
        let mut preamble: Vec<&str> = Vec::new();

        for line in lines {
            if let Some(caps) = self.lesson_re.captures(line) {
                let number: u32 = caps[1].parse().map_err(|_| {
                    CoursemateError::Ingestion(format!("invalid lesson number in '{}'", line))
                })?;
                course.lessons.push(Lesson {
                    lesson_number: number,
                    title: caps[2].trim().to_string(),
                    lesson_link: None,
                });
                sections.push((Some(number), Vec::new()));
                continue;
            }

            match sections.last_mut() {
                Some((_, body)) => {
                    if let Some(caps) = self.lesson_link_re.captures(line) {
                        if let Some(lesson) = course.lessons.last_mut() {
                            if lesson.lesson_link.is_none() && body.is_empty() {
                                lesson.lesson_link = Some(caps[1].trim().to_string());
                                continue;
                            }
                        }
                    }
                    if !line.is_empty() {
                        body.push(line);
                    }
                }
                None if !line.is_empty() => preamble.push(line),
                None => {}
            }
        }

        // Documents without lesson markers are indexed as course-level content.
        if sections.is_empty() && !preamble.is_empty() {
            sections.push((None, preamble));
        }

        let mut chunks = Vec::new();
        for (lesson_number, body) in sections {
            let text = body.join(" ");
            for (i, piece) in chunk_text(&text, self.chunk_size, self.chunk_overlap)
                .into_iter()
                .enumerate()
            {
                let content = match (i, lesson_number) {
                    (0, Some(n)) => format!("Lesson {} content: {}", n, piece),
                    _ => piece,
                };
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number,
                    chunk_index: chunks.len(),
                });
            }
        }

        debug!(
            "Parsed '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );
        Ok((course, chunks))
    }
}

/// Read and parse a course document from disk.
pub fn load_course_document(
    path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(Course, Vec<CourseChunk>)> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    CourseDocumentParser::new(chunk_size, chunk_overlap)?.parse(&text, &fallback)
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace and a capital letter.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for (pos, &(idx, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let followed_by_space = chars.get(pos + 1).is_some_and(|(_, n)| n.is_whitespace());
        let next_word_capital = chars[pos + 1..]
            .iter()
            .find(|(_, n)| !n.is_whitespace())
            .is_some_and(|(_, n)| n.is_uppercase());

        if followed_by_space && next_word_capital {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Group sentences into chunks of at most `chunk_size` characters.
///
/// Consecutive chunks share trailing sentences totalling at most `overlap`
/// characters. A single sentence longer than `chunk_size` forms its own chunk.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentences = split_sentences(&normalized);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < sentences.len() {
        let mut size = 0;
        let mut end = start;
        while end < sentences.len() {
            let added = sentences[end].len() + usize::from(end > start);
            if end > start && size + added > chunk_size {
                break;
            }
            size += added;
            end += 1;
        }

        chunks.push(sentences[start..end].join(" "));
        if end == sentences.len() {
            break;
        }

        let mut carried = 0;
        let mut carried_size = 0;
        for sentence in sentences[start..end].iter().rev() {
            let added = sentence.len() + 1;
            if carried_size + added > overlap {
                break;
            }
            carried_size += added;
            carried += 1;
        }
        start = (end - carried).max(start + 1);
    }

    chunks
}
