/// How captured frames are thinned down to the streaming rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingPolicy {
    /// Forward frame `n` when `floor(n*T/C)` advances; spreads frames evenly
    /// for any ratio.
    #[default]
    Accumulator,
    /// Forward every `floor(C/T)`-th frame.
    FixedStride,
}

impl SamplingPolicy {
    /// Whether 1-based frame `n` is forwarded at `target` out of `capture` fps.
    pub fn admits(self, n: u64, capture: u32, target: u32) -> bool {
        if n == 0 || target == 0 {
            return false;
        }
        if capture == 0 || target >= capture {
            return true;
        }

        match self {
            SamplingPolicy::Accumulator => {
                let (n, c, t) = (u128::from(n), u128::from(capture), u128::from(target));
                (n * t) / c > ((n - 1) * t) / c
            }
            SamplingPolicy::FixedStride => {
                let ratio = u64::from(capture / target);
                n % ratio == 0
            }
        }
    }
}
