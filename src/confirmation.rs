use rand::Rng;

/// Uppercase letters followed by digits.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Produces the token shared by all booking rows of one reservation.
pub trait ConfirmationCodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length: length.max(1) }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl ConfirmationCodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_code_shape() {
        let code = RandomCodeGenerator::default().generate();
        assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn custom_length() {
        assert_eq!(RandomCodeGenerator::new(12).generate().len(), 12);
        // zero is bumped to one character
        assert_eq!(RandomCodeGenerator::new(0).generate().len(), 1);
    }
}
