//! Shared fixtures for the integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use horizon_icons::{IconLoader, IconSubsystem, ManualClock, SubsystemConfig};
use image::{Rgba, RgbaImage};
use tempfile::TempDir;

pub const HICOLOR: &str = "\
[Icon Theme]
Name=Hicolor
Comment=Fallback icon theme
Directories=16x16/apps,22x22/apps,32x32/apps,48x48/apps,22x22/mimetypes,scalable/apps

[16x16/apps]
Size=16
Context=Applications
Type=Threshold

[22x22/apps]
Size=22
Context=Applications
Type=Fixed

[32x32/apps]
Size=32
Context=Applications
Type=Fixed

[48x48/apps]
Size=48
Context=Applications
Type=Fixed

[22x22/mimetypes]
Size=22
Context=MimeTypes
Type=Fixed

[scalable/apps]
Size=48
MinSize=8
MaxSize=512
Context=Applications
Type=Scalable
";

pub const BLUE: [u8; 4] = [0, 0, 255, 255];
#[allow(dead_code)]
pub const RED: [u8; 4] = [255, 0, 0, 255];
#[allow(dead_code)]
pub const GREEN: [u8; 4] = [0, 255, 0, 255];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("horizon_icons=debug")
        .try_init();
}

/// A temporary data directory holding a `hicolor` theme.
pub struct Fixture {
    _dir: TempDir,
    pub data: PathBuf,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("share");
        let fixture = Self {
            _dir: dir,
            data,
            clock: Arc::new(ManualClock::new()),
        };
        fixture.write_theme(
            "hicolor",
            HICOLOR,
            &[
                "16x16/apps",
                "22x22/apps",
                "32x32/apps",
                "48x48/apps",
                "22x22/mimetypes",
                "scalable/apps",
            ],
        );
        fixture
    }

    pub fn theme_dir(&self, theme: &str) -> PathBuf {
        self.data.join("icons").join(theme)
    }

    /// Write `index.theme` for `theme` and create its icon directories.
    pub fn write_theme(&self, theme: &str, descriptor: &str, dirs: &[&str]) {
        let root = self.theme_dir(theme);
        for dir in dirs {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.theme"), descriptor).unwrap();
    }

    /// Write a solid PNG below the data directory.
    pub fn write_png(&self, relative: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
        self.write_image(relative, &RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[allow(dead_code)]
    pub fn write_image(&self, relative: &str, image: &RgbaImage) -> PathBuf {
        let path = self.data.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image.save(&path).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.data.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn config(&self) -> SubsystemConfig {
        SubsystemConfig::with_data_dirs(vec![self.data.clone()]).with_clock(self.clock.clone())
    }

    #[allow(dead_code)]
    pub fn subsystem(&self) -> Arc<IconSubsystem> {
        Arc::new(IconSubsystem::new(self.config()))
    }

    #[allow(dead_code)]
    pub fn loader(&self) -> IconLoader {
        IconLoader::with_subsystem(self.subsystem(), "testapp", Vec::new())
    }

    #[allow(dead_code)]
    pub fn loader_with(&self, config: SubsystemConfig) -> IconLoader {
        IconLoader::with_subsystem(Arc::new(IconSubsystem::new(config)), "testapp", Vec::new())
    }
}

#[allow(dead_code)]
pub fn pixel(icon: &horizon_icons::LoadedIcon, x: u32, y: u32) -> [u8; 4] {
    icon.pixmap.image().get_pixel(x, y).0
}
