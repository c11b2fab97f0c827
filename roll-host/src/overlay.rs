//! # Overlay 模块
//!
//! 直播叠加层的同步与链接。
//!
//! - [`OverlayFile`]：把最后一次选中状态写入 `current_selection.json`，
//!   叠加层进程读取该文件即可得到与主视图相同的状态
//! - [`overlay_query`]：生成叠加层页面的 query（`name`、`heroes`、样式参数）

use std::fs;
use std::path::{Path, PathBuf};

use roll_runtime::{Item, LastValueStore, SelectionUpdate, SyncError};
use url::form_urlencoded;

/// 默认背景色
pub const DEFAULT_BG_COLOR: &str = "#000000";
/// 默认背景不透明度
pub const DEFAULT_BG_OPACITY: f64 = 0.8;

/// 基于文件的最后一个值
#[derive(Debug, Clone)]
pub struct OverlayFile {
    path: PathBuf,
}

impl OverlayFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LastValueStore for OverlayFile {
    fn store(&mut self, update: &SelectionUpdate) -> Result<(), SyncError> {
        let json =
            serde_json::to_string_pretty(update).map_err(|e| SyncError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::Io(e.to_string()))?;
        }
        fs::write(&self.path, json).map_err(|e| SyncError::Io(e.to_string()))
    }

    fn load(&self) -> Option<SelectionUpdate> {
        let json = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&json) {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "叠加层文件损坏，忽略");
                None
            }
        }
    }
}

/// 叠加层样式
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayStyle {
    /// 透明模式（无背景）
    pub plain: bool,
    /// 背景色（`#rgb` 或 `#rrggbb`）
    pub bg_color: Option<String>,
    /// 背景不透明度 `[0, 1]`
    pub bg_opacity: Option<f64>,
}

impl OverlayStyle {
    /// 透明模式
    pub fn plain() -> Self {
        Self {
            plain: true,
            ..Self::default()
        }
    }

    /// 有效的背景色（无效值被丢弃）
    pub fn valid_bg_color(&self) -> Option<&str> {
        self.bg_color.as_deref().filter(|c| is_hex_color(c))
    }

    /// 有效的不透明度（无效值被丢弃）
    pub fn valid_bg_opacity(&self) -> Option<f64> {
        self.bg_opacity
            .filter(|o| o.is_finite() && (0.0..=1.0).contains(o))
    }

    /// CSS 背景：`#rrggbbaa`，透明模式为 `transparent`
    pub fn background(&self) -> String {
        if self.plain {
            return "transparent".to_string();
        }
        let color = self.valid_bg_color().unwrap_or(DEFAULT_BG_COLOR);
        let opacity = self.valid_bg_opacity().unwrap_or(DEFAULT_BG_OPACITY);
        format!("{}{:02x}", color, (opacity * 255.0).round() as u8)
    }
}

/// `#rgb` 或 `#rrggbb`
fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// 生成叠加层 query
///
/// `name=…&heroes=a,b,c`，随后是 `plain=1`（透明模式）或有效的 `bgColor` / `bgOpacity`。
pub fn overlay_query(item: &Item, style: &OverlayStyle) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("name", &item.name);
    query.append_pair("heroes", &item.assets.join(","));

    if style.plain {
        query.append_pair("plain", "1");
    } else {
        if let Some(color) = style.valid_bg_color() {
            query.append_pair("bgColor", color);
        }
        if let Some(opacity) = style.valid_bg_opacity() {
            query.append_pair("bgOpacity", &opacity.to_string());
        }
    }
    query.finish()
}

/// 完整的叠加层链接
pub fn overlay_link(base_url: &str, item: &Item, style: &OverlayStyle) -> String {
    format!("{}?{}", base_url, overlay_query(item, style))
}

/// 解析叠加层 query（叠加层一侧的读取规则）
///
/// 缺少 `name` 或 `heroes` 时返回 None；无效的样式参数被忽略。
pub fn parse_overlay_query(query: &str) -> Option<(Item, OverlayStyle)> {
    let mut name = None;
    let mut heroes = None;
    let mut style = OverlayStyle::default();

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match &*key {
            "name" => name = Some(value.into_owned()),
            "heroes" => heroes = Some(value.into_owned()),
            "plain" => style.plain = value == "1" || value == "true",
            "bgColor" => style.bg_color = Some(value.into_owned()),
            "bgOpacity" => style.bg_opacity = value.parse().ok(),
            _ => {}
        }
    }

    if style.plain {
        style.bg_color = None;
        style.bg_opacity = None;
    } else {
        style.bg_color = style.valid_bg_color().map(str::to_string);
        style.bg_opacity = style.valid_bg_opacity();
    }

    let name = name.filter(|n| !n.is_empty())?;
    let heroes = heroes.filter(|h| !h.is_empty())?;
    let assets = heroes.split(',').map(str::to_string).collect();
    Some((Item::new(name, assets), style))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::new("Духи и ко", vec!["a.png".to_string(), "b.png".to_string()])
    }

    #[test]
    fn test_overlay_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = OverlayFile::new(dir.path().join("obs").join("current_selection.json"));
        assert!(file.load().is_none());

        let update = SelectionUpdate::from_item(&item(), true);
        file.store(&update).unwrap();
        assert_eq!(file.load(), Some(update));
    }

    #[test]
    fn test_query_plain() {
        let query = overlay_query(&item(), &OverlayStyle::plain());
        assert!(query.starts_with("name="));
        assert!(query.contains("&heroes=a.png%2Cb.png"));
        assert!(query.ends_with("&plain=1"));
        assert!(!query.contains("bgColor"));
    }

    #[test]
    fn test_query_drops_invalid_style() {
        let style = OverlayStyle {
            plain: false,
            bg_color: Some("red".to_string()),
            bg_opacity: Some(1.5),
        };
        let query = overlay_query(&item(), &style);
        assert!(!query.contains("bgColor"));
        assert!(!query.contains("bgOpacity"));

        let style = OverlayStyle {
            plain: false,
            bg_color: Some("#1a2B3c".to_string()),
            bg_opacity: Some(0.25),
        };
        let query = overlay_query(&item(), &style);
        assert!(query.ends_with("&bgColor=%231a2B3c&bgOpacity=0.25"));
    }

    #[test]
    fn test_parse_overlay_query() {
        let style = OverlayStyle {
            plain: false,
            bg_color: Some("#abc".to_string()),
            bg_opacity: Some(0.5),
        };
        let query = overlay_query(&item(), &style);
        assert_eq!(parse_overlay_query(&query), Some((item(), style)));

        assert!(parse_overlay_query("name=x").is_none());
        let (_, style) = parse_overlay_query("?name=x&heroes=h&bgColor=zzz&bgOpacity=2").unwrap();
        assert_eq!(style, OverlayStyle::default());
    }

    #[test]
    fn test_background() {
        assert_eq!(OverlayStyle::plain().background(), "transparent");
        assert_eq!(OverlayStyle::default().background(), "#000000cc");
        let style = OverlayStyle {
            plain: false,
            bg_color: Some("#ff0000".to_string()),
            bg_opacity: Some(1.0),
        };
        assert_eq!(style.background(), "#ff0000ff");
    }

    #[test]
    fn test_link() {
        let link = overlay_link("http://localhost:5173/obs", &item(), &OverlayStyle::plain());
        assert!(link.starts_with("http://localhost:5173/obs?name="));
    }
}
