use rand::Rng;

/// Browser fingerprint rotated per session to avoid trivial detection.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

impl FingerprintConfig {
    /// Pick a random user agent and viewport from the common-desktop pool.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        let (width, height) = VIEWPORTS[rng.gen_range(0..VIEWPORTS.len())];

        Self {
            user_agent: USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())].to_string(),
            viewport_width: width,
            viewport_height: height,
        }
    }

    /// Chromium command-line arguments carrying this fingerprint.
    pub fn chrome_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!(
                "--window-size={},{}",
                self.viewport_width, self.viewport_height
            ),
        ]
    }
}
