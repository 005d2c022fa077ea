use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Token usage of one or more model requests.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Usage {
    /// Tokens in the input messages.
    pub prompt_tokens: u64,
    /// Tokens generated by the model.
    pub completion_tokens: u64,
    /// Sum of the two above, as reported by the provider.
    pub total_tokens: u64,
}

impl Add for Usage {
    type Output = Usage;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Usage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for Usage {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut total = Usage::default();
        total += Usage {
            prompt_tokens: 10,
            completion_tokens: 2,
            total_tokens: 12,
        };
        total += Usage {
            prompt_tokens: 30,
            completion_tokens: 5,
            total_tokens: 35,
        };
        assert_eq!(total.prompt_tokens, 40);
        assert_eq!(total.completion_tokens, 7);
        assert_eq!(total.total_tokens, 47);
    }
}
