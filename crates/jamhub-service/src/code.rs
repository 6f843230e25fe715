//! Random jam code generation.

use rand::Rng;

use jamhub_core::types::JamCode;
use jamhub_core::types::id::{JAM_CODE_ALPHABET, MAX_JAM_CODE_LEN};

/// Generates short human-shareable jam codes.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    /// Characters per code.
    length: usize,
}

impl CodeGenerator {
    /// Create a generator for codes of `length` characters, kept within what
    /// [`JamCode::parse`] accepts.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(1, MAX_JAM_CODE_LEN),
        }
    }

    /// Draw a fresh random code. Uniqueness is checked by the store.
    pub fn generate(&self) -> JamCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| {
                let idx = rng.gen_range(0..JAM_CODE_ALPHABET.len());
                JAM_CODE_ALPHABET[idx] as char
            })
            .collect();
        JamCode::from_generated(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_parses_back() {
        let generator = CodeGenerator::new(6);
        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert_eq!(JamCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_oversized_length_still_parses_back() {
        let code = CodeGenerator::new(64).generate();
        assert_eq!(code.as_str().len(), MAX_JAM_CODE_LEN);
        assert!(JamCode::parse(code.as_str()).is_ok());
    }
}
