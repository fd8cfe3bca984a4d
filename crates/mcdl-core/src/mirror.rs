//! Static mirror table: official download hosts rewritten to BMCLAPI.

use std::borrow::Cow;

use crate::config::DownloaderConfig;
use crate::request::DownloadRequest;

/// Official prefix → BMCLAPI prefix.
pub const BMCLAPI: &[(&str, &str)] = &[
    ("https://resources.download.minecraft.net", "https://bmclapi2.bangbang93.com/assets"),
    ("https://piston-meta.mojang.com", "https://bmclapi2.bangbang93.com"),
    ("https://launchermeta.mojang.com", "https://bmclapi2.bangbang93.com"),
    ("https://launcher.mojang.com", "https://bmclapi2.bangbang93.com"),
    ("https://libraries.minecraft.net", "https://bmclapi2.bangbang93.com/maven"),
    ("https://maven.minecraftforge.net", "https://bmclapi2.bangbang93.com/maven"),
    ("https://files.minecraftforge.net/maven", "https://bmclapi2.bangbang93.com/maven"),
    ("https://maven.fabricmc.net", "https://bmclapi2.bangbang93.com/maven"),
    ("https://meta.fabricmc.net", "https://bmclapi2.bangbang93.com/fabric-meta"),
    (
        "https://maven.neoforged.net/releases/net/neoforged/forge",
        "https://bmclapi2.bangbang93.com/maven/net/neoforged/forge",
    ),
];

/// Prefix substitution table. Longest matching prefix wins.
#[derive(Debug, Clone)]
pub struct MirrorTable {
    entries: Vec<(String, String)>,
}

impl MirrorTable {
    pub fn new<I, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(s, t)| (s.into(), t.into()))
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    pub fn bmclapi() -> Self {
        Self::new(BMCLAPI.iter().copied())
    }

    /// Mirror URL for `url`, or `None` when no prefix matches. A prefix only
    /// matches whole path segments, so `https://launcher.mojang.com.evil` is left alone.
    pub fn rewrite(&self, url: &str) -> Option<String> {
        self.entries.iter().find_map(|(source, mirror)| {
            let rest = url.strip_prefix(source.as_str())?;
            if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
                Some(format!("{mirror}{rest}"))
            } else {
                None
            }
        })
    }
}

/// Applies a [`MirrorTable`] only when mirroring is enabled.
#[derive(Debug, Clone, Default)]
pub struct UrlRewriter {
    table: Option<MirrorTable>,
}

impl UrlRewriter {
    pub fn new(enabled: bool) -> Self {
        Self {
            table: enabled.then(MirrorTable::bmclapi),
        }
    }

    pub fn from_config(cfg: &DownloaderConfig) -> Self {
        Self::new(cfg.enable_mirror)
    }

    pub fn with_table(table: MirrorTable) -> Self {
        Self { table: Some(table) }
    }

    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    pub fn rewrite<'a>(&self, url: &'a str) -> Cow<'a, str> {
        match self.table.as_ref().and_then(|t| t.rewrite(url)) {
            Some(mirrored) => {
                tracing::trace!(url, mirrored = %mirrored, "mirror rewrite");
                Cow::Owned(mirrored)
            }
            None => Cow::Borrowed(url),
        }
    }

    pub fn apply(&self, mut request: DownloadRequest) -> DownloadRequest {
        if let Cow::Owned(url) = self.rewrite(&request.url) {
            request.url = url;
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_and_libraries() {
        let t = MirrorTable::bmclapi();
        assert_eq!(
            t.rewrite("https://resources.download.minecraft.net/ab/abcdef").as_deref(),
            Some("https://bmclapi2.bangbang93.com/assets/ab/abcdef")
        );
        assert_eq!(
            t.rewrite("https://libraries.minecraft.net/com/mojang/x.jar").as_deref(),
            Some("https://bmclapi2.bangbang93.com/maven/com/mojang/x.jar")
        );
    }

    #[test]
    fn longest_prefix_wins() {
        let t = MirrorTable::new([
            ("https://a.example", "https://m/a"),
            ("https://a.example/deep", "https://m/deep"),
        ]);
        assert_eq!(
            t.rewrite("https://a.example/deep/file").as_deref(),
            Some("https://m/deep/file")
        );
        assert_eq!(t.rewrite("https://a.example/x").as_deref(), Some("https://m/a/x"));
    }

    #[test]
    fn host_boundary_respected() {
        let t = MirrorTable::bmclapi();
        assert!(t.rewrite("https://launcher.mojang.com.evil/x").is_none());
        assert!(t.rewrite("https://example.com/file").is_none());
    }

    #[test]
    fn disabled_rewriter_is_identity() {
        let url = "https://piston-meta.mojang.com/v1/packages/x.json";
        let off = UrlRewriter::new(false);
        assert!(matches!(off.rewrite(url), Cow::Borrowed(_)));
        let on = UrlRewriter::new(true);
        assert_eq!(
            on.rewrite(url),
            "https://bmclapi2.bangbang93.com/v1/packages/x.json"
        );
    }

    #[test]
    fn apply_rewrites_request_url_only() {
        let r = DownloadRequest::new("https://meta.fabricmc.net/v2/versions", "v.json").with_size(3);
        let out = UrlRewriter::new(true).apply(r);
        assert_eq!(out.url, "https://bmclapi2.bangbang93.com/fabric-meta/v2/versions");
        assert_eq!(out.expected_size, Some(3));
    }
}
