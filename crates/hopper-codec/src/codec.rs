use crate::error::{DecodeError, SettingsError};
use crate::shuffle::consistent_shuffle;
use typed_builder::TypedBuilder;

/// Lower and upper case ASCII letters plus digits. Nothing that needs
/// escaping in a URL path.
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

pub const DEFAULT_MIN_LENGTH: usize = 3;

/// Largest key the codec round-trips. Keys are 63-bit so that they fit a
/// signed SQL integer column.
pub const MAX_KEY: u64 = i64::MAX as u64;

const SEPARATORS: &[u8] = b"cfhistuCFHISTU";
const MIN_ALPHABET_LENGTH: usize = 16;
const SEPARATOR_RATIO: f64 = 3.5;
const GUARD_RATIO: f64 = 12.0;

/// Configures a [`Codec`] instance.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CodecSettings {
    /// Secret mixed into every shuffle. Changing it changes every public id.
    #[builder(setter(into))]
    pub salt: String,
    /// Encoded ids are padded up to this many characters.
    #[builder(default = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,
    /// Characters ids are drawn from. Duplicates are ignored.
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
}

/// Bidirectional mapping between record keys and public ids.
///
/// A `Codec` is immutable once built, so it can be cloned into every store
/// and shared between threads without locking.
#[derive(Debug, Clone)]
pub struct Codec {
    salt: Vec<u8>,
    min_length: usize,
    alphabet: Vec<u8>,
    separators: Vec<u8>,
    guards: Vec<u8>,
}

impl Codec {
    pub fn new(settings: CodecSettings) -> Result<Self, SettingsError> {
        if !settings.alphabet.is_ascii() {
            return Err(SettingsError::NonAsciiAlphabet);
        }

        let mut alphabet: Vec<u8> = Vec::with_capacity(settings.alphabet.len());
        for c in settings.alphabet.bytes() {
            if !alphabet.contains(&c) {
                alphabet.push(c);
            }
        }

        if alphabet.len() < MIN_ALPHABET_LENGTH {
            return Err(SettingsError::AlphabetTooShort {
                min: MIN_ALPHABET_LENGTH,
                actual: alphabet.len(),
            });
        }
        if alphabet.iter().any(u8::is_ascii_whitespace) {
            return Err(SettingsError::WhitespaceInAlphabet);
        }

        let salt = settings.salt.into_bytes();

        // Separators are carved out of the alphabet, topped up from it when
        // the alphabet would otherwise dwarf them.
        let mut separators: Vec<u8> = SEPARATORS
            .iter()
            .copied()
            .filter(|c| alphabet.contains(c))
            .collect();
        alphabet.retain(|c| !separators.contains(c));
        consistent_shuffle(&mut separators, &salt);

        if separators.is_empty()
            || alphabet.len() as f64 / separators.len() as f64 > SEPARATOR_RATIO
        {
            let wanted = ((alphabet.len() as f64 / SEPARATOR_RATIO).ceil() as usize).max(2);
            if wanted > separators.len() {
                let missing = wanted - separators.len();
                separators.extend(alphabet.drain(..missing));
            } else {
                separators.truncate(wanted);
            }
        }

        consistent_shuffle(&mut alphabet, &salt);

        let guard_count = (alphabet.len() as f64 / GUARD_RATIO).ceil() as usize;
        let guards = if alphabet.len() < 3 {
            separators.drain(..guard_count).collect()
        } else {
            alphabet.drain(..guard_count).collect()
        };

        Ok(Self {
            salt,
            min_length: settings.min_length,
            alphabet,
            separators,
            guards,
        })
    }

    /// Encodes `key` into its public id.
    ///
    /// Keys above [`MAX_KEY`] are encoded but will not decode back.
    pub fn encode(&self, key: u64) -> String {
        debug_assert!(key <= MAX_KEY, "key {key} exceeds 63 bits");

        let mut alphabet = self.alphabet.clone();
        let key_hash = (key % 100) as usize;
        let lottery = alphabet[key_hash % alphabet.len()];

        self.shuffle_for_lottery(&mut alphabet, lottery);

        let mut out = Vec::with_capacity(self.min_length.max(16));
        out.push(lottery);
        write_positional(key, &alphabet, &mut out);

        if out.len() < self.min_length {
            let index = (key_hash + usize::from(out[0])) % self.guards.len();
            out.insert(0, self.guards[index]);

            if out.len() < self.min_length {
                let index = (key_hash + usize::from(out[2])) % self.guards.len();
                out.push(self.guards[index]);
            }
        }

        let half = alphabet.len() / 2;
        while out.len() < self.min_length {
            let salt = alphabet.clone();
            consistent_shuffle(&mut alphabet, &salt);

            let mut padded = Vec::with_capacity(out.len() + alphabet.len());
            padded.extend_from_slice(&alphabet[half..]);
            padded.extend_from_slice(&out);
            padded.extend_from_slice(&alphabet[..half]);

            let excess = padded.len().saturating_sub(self.min_length);
            if excess > 0 {
                let start = excess / 2;
                padded = padded[start..start + self.min_length].to_vec();
            }
            out = padded;
        }

        out.into_iter().map(char::from).collect()
    }

    /// Decodes a public id back into its key.
    ///
    /// Only canonical encodings are accepted: the decoded key is re-encoded
    /// and compared with the input.
    pub fn decode(&self, public_id: &str) -> Result<u64, DecodeError> {
        if public_id.is_empty() {
            return Err(DecodeError::Empty);
        }
        if let Some(c) = public_id.chars().find(|c| !c.is_ascii()) {
            return Err(DecodeError::InvalidCharacter(c));
        }

        let raw = public_id.as_bytes();
        let parts: Vec<&[u8]> = raw.split(|c| self.guards.contains(c)).collect();
        let body = match parts.len() {
            2 | 3 => parts[1],
            _ => parts[0],
        };

        let Some((&lottery, rest)) = body.split_first() else {
            return Err(DecodeError::Malformed);
        };

        let mut segments = rest.split(|c| self.separators.contains(c));
        let digits = segments.next().unwrap_or_default();
        if segments.next().is_some() {
            return Err(DecodeError::Malformed);
        }

        let mut alphabet = self.alphabet.clone();
        self.shuffle_for_lottery(&mut alphabet, lottery);

        let key = read_positional(digits, &alphabet)?;
        if key > MAX_KEY {
            return Err(DecodeError::Overflow);
        }

        if self.encode(key).as_bytes() != raw {
            return Err(DecodeError::NotCanonical);
        }

        Ok(key)
    }

    fn shuffle_for_lottery(&self, alphabet: &mut [u8], lottery: u8) {
        let mut buffer = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        buffer.push(lottery);
        buffer.extend_from_slice(&self.salt);
        buffer.extend_from_slice(alphabet);
        buffer.truncate(alphabet.len());
        consistent_shuffle(alphabet, &buffer);
    }
}

fn write_positional(mut value: u64, alphabet: &[u8], out: &mut Vec<u8>) {
    let base = alphabet.len() as u64;
    let start = out.len();
    loop {
        out.push(alphabet[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    out[start..].reverse();
}

fn read_positional(digits: &[u8], alphabet: &[u8]) -> Result<u64, DecodeError> {
    let base = alphabet.len() as u64;
    digits.iter().try_fold(0_u64, |acc, c| {
        let position = alphabet
            .iter()
            .position(|a| a == c)
            .ok_or(DecodeError::InvalidCharacter(char::from(*c)))?;
        acc.checked_mul(base)
            .and_then(|v| v.checked_add(position as u64))
            .ok_or(DecodeError::Overflow)
    })
}
