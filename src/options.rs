use num_rational::Rational32;

/// What to do with a decoded frame whose auxiliary metrics are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsPolicy {
    /// Skip the frame and move on to the next one.
    #[default]
    Required,
    /// Return the frame with only its base fields.
    Optional,
}

/// Where the final sequence bitrate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitratePolicy {
    /// Always derive the bitrate from the accumulated frame sizes once a
    /// frame has been parsed, overriding whatever the container reported.
    #[default]
    Recompute,
    /// Keep a nonzero container bitrate and only derive one when it is
    /// missing.
    PreferContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub metrics: MetricsPolicy,
    pub bitrate: BitratePolicy,
    /// Nominal frame rate for raw elementary streams, which carry no
    /// timestamps of their own.
    pub raw_frame_rate: Rational32,
    pub verbose: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            metrics: MetricsPolicy::default(),
            bitrate: BitratePolicy::default(),
            raw_frame_rate: Rational32::new(25, 1),
            verbose: false,
        }
    }
}

impl ParserOptions {
    #[must_use]
    pub const fn with_metrics(mut self, metrics: MetricsPolicy) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub const fn with_bitrate(mut self, bitrate: BitratePolicy) -> Self {
        self.bitrate = bitrate;
        self
    }

    #[must_use]
    pub const fn with_raw_frame_rate(mut self, raw_frame_rate: Rational32) -> Self {
        self.raw_frame_rate = raw_frame_rate;
        self
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
