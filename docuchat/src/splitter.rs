pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
}

/// Splits text into overlapping chunks sized for the embedding model.
#[must_use]
pub fn split(text: &str) -> Vec<Chunk> {
    split_with(text, CHUNK_SIZE, CHUNK_OVERLAP)
}

/// # Panics
///
/// Panics if `overlap >= chunk_size`, since the window would never advance.
#[must_use]
pub fn split_with(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    assert!(overlap < chunk_size, "overlap must be smaller than chunk size");

    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();

        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                index: chunks.len(),
            });
        }

        if end == chars.len() {
            break;
        }

        start += chunk_size - overlap;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split("Hello world");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_and_whitespace_input_produce_nothing() {
        assert!(split("").is_empty());
        assert!(split("   \n\t  ").is_empty());
    }

    #[test]
    fn windows_overlap_by_the_configured_amount() {
        let text = "a".repeat(100);
        let chunks = split_with(&text, 40, 10);

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text.len(), 40);
        assert_eq!(chunks[0].text[30..], chunks[1].text[..10]);
    }

    #[test]
    fn no_chunk_exceeds_the_window_size() {
        let text = "word ".repeat(500);

        for chunk in split(&text) {
            assert!(chunk.text.chars().count() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let text = "b".repeat(3000);
        let indices: Vec<usize> = split(&text).into_iter().map(|c| c.index).collect();

        assert_eq!(indices, (0..indices.len()).collect::<Vec<_>>());
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "é".repeat(50);
        let chunks = split_with(&text, 20, 5);

        assert!(chunks.iter().all(|c| c.text.chars().count() <= 20));
    }
}
