use serde::{Deserialize, Serialize};
use std::fmt;

/// A player name. Player names double as constants in the generated
/// theory, so only some names are usable there (see `is_valid_constant`).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Player(String);

impl Player {
    pub fn new(name: &str) -> Self {
        Player(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constants start with a lower case letter (upper case starts a
    /// variable) and must not clash with the time points `n0`, `n1`, ...
    pub fn is_valid_constant(&self) -> bool {
        let mut chars = self.0.chars();
        let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase());
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        first_ok && rest_ok && !is_time_point(&self.0)
    }

    /// Names `a`, `b`, ..., `z`, then `p26`, `p27`, ... for the `index`:th player.
    pub fn nth(index: usize) -> Self {
        if index < 26 {
            Player(((b'a' + index as u8) as char).to_string())
        } else {
            Player(format!("p{index}"))
        }
    }
}

/// The symbolic time point at round boundary `index`.
pub fn time_point(index: usize) -> String {
    format!("n{index}")
}

/// Parses `n<digits>` back into its round index.
pub fn time_index(name: &str) -> Option<usize> {
    name.strip_prefix('n')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}

fn is_time_point(name: &str) -> bool {
    time_index(name).is_some()
}

impl From<&str> for Player {
    fn from(name: &str) -> Self {
        Player::new(name)
    }
}

impl From<String> for Player {
    fn from(name: String) -> Self {
        Player(name)
    }
}

impl From<&Player> for Player {
    fn from(p: &Player) -> Self {
        p.clone()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test_player {
    use super::*;

    #[test]
    fn constants() {
        assert!(Player::from("a").is_valid_constant());
        assert!(Player::from("alice_2").is_valid_constant());
        assert!(Player::from("nina").is_valid_constant());
        assert!(!Player::from("Alice").is_valid_constant());
        assert!(!Player::from("").is_valid_constant());
        assert!(!Player::from("a-b").is_valid_constant());
        assert!(!Player::from("n3").is_valid_constant());
    }

    #[test]
    fn generated_names() {
        assert_eq!(Player::nth(0).as_str(), "a");
        assert_eq!(Player::nth(25).as_str(), "z");
        assert_eq!(Player::nth(26).as_str(), "p26");
        assert!(Player::nth(30).is_valid_constant());
    }

    #[test]
    fn time_points() {
        assert_eq!(time_point(3), "n3");
        assert_eq!(time_index("n12"), Some(12));
        assert_eq!(time_index("n"), None);
        assert_eq!(time_index("nx"), None);
        assert_eq!(time_index("a1"), None);
    }
}
