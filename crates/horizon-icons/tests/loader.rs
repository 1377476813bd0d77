//! End to end lookups against themes written to a temporary directory.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{BLUE, Fixture, GREEN, RED, pixel};
use horizon_icons::{
    Color, ColorPalette, IconContext, IconGroup, IconRequest, IconState, Settings, SettingsSource,
};
use image::{Rgba, RgbaImage};

const FOLLOWING_THEME: &str = "\
[Icon Theme]
Name=Breeze
Inherits=hicolor
FollowsColorScheme=true
Directories=scalable/apps

[scalable/apps]
Size=16
MinSize=8
MaxSize=256
Context=Applications
Type=Scalable
";

const COLORED_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16" viewBox="0 0 16 16">
<style type="text/css" id="current-color-scheme">.ColorScheme-Text { color:#000000; }</style>
<rect class="ColorScheme-Text" style="fill:currentColor" x="0" y="0" width="16" height="16"/>
</svg>
"#;

fn patterned_icon(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255]))
}

#[test]
fn test_exact_size_returns_file_pixels() {
    let fixture = Fixture::new();
    let path = fixture.write_image("icons/hicolor/22x22/apps/kde.png", &patterned_icon(22));
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();

    assert!(!icon.was_unknown);
    assert!(icon.path.as_ref().unwrap().ends_with("hicolor/22x22/apps/kde.png"));
    let expected = image::open(&path).unwrap().to_rgba8();
    assert_eq!(icon.pixmap.dimensions(), (22, 22));
    assert_eq!(icon.pixmap.as_raw(), expected.as_raw().as_slice());
}

#[test]
fn test_disabled_effect_from_settings() {
    let fixture = Fixture::new();
    let image = RgbaImage::from_fn(32, 32, |x, y| {
        if x < 16 && y < 16 {
            Rgba([240, 130, 0, 255])
        } else {
            Rgba(BLUE)
        }
    });
    fixture.write_image("icons/hicolor/32x32/apps/kde.png", &image);

    let settings = Settings::parse(
        "[DesktopIcons]\nDisabledEffect=togray\nDisabledValue=1\nDisabledSemiTransparent=true\n",
    )
    .unwrap();
    let mut loader = fixture.loader_with(fixture.config().with_global_settings(settings));

    let icon = loader
        .load_icon("kde", IconGroup::Desktop, 32, IconState::Disabled, &[], false)
        .unwrap();
    assert_eq!(pixel(&icon, 5, 5), [147, 147, 147, 127]);

    let normal = loader
        .load_icon("kde", IconGroup::Desktop, 32, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&normal, 5, 5), [240, 130, 0, 255]);
}

#[test]
fn test_name_fallback_drops_suffixes() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("kde-specific-icon", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(!icon.was_unknown);
    assert!(icon.path.unwrap().ends_with("hicolor/22x22/apps/kde.png"));
}

#[test]
fn test_mime_type_falls_back_to_octet_stream() {
    let fixture = Fixture::new();
    fixture.write_png(
        "icons/hicolor/22x22/mimetypes/application-octet-stream.png",
        22,
        22,
        GREEN,
    );
    let mut loader = fixture.loader();

    let icon = loader
        .load_mime_type_icon("text/x-unheard-of", IconGroup::Desktop, 24, IconState::Default)
        .unwrap();
    assert!(!icon.was_unknown);
    assert!(icon.path.unwrap().ends_with("application-octet-stream.png"));
    assert_eq!(icon.pixmap.dimensions(), (24, 24));
}

#[test]
fn test_font_mime_type_falls_back_to_octet_stream() {
    let fixture = Fixture::new();
    fixture.write_png(
        "icons/hicolor/22x22/mimetypes/application-octet-stream.png",
        22,
        22,
        GREEN,
    );
    let mut loader = fixture.loader();

    let icon = loader
        .load_mime_type_icon("application/x-font-vfont", IconGroup::Desktop, 24, IconState::Default)
        .unwrap();
    assert!(!icon.was_unknown);
    assert!(icon.path.as_ref().unwrap().ends_with("application-octet-stream.png"));
    assert_eq!(icon.pixmap.dimensions(), (24, 24));
    assert_eq!(pixel(&icon, 12, 12), GREEN);
}

#[test]
fn test_mime_type_generic_icon_from_tree() {
    let fixture = Fixture::new();
    fixture.write_png(
        "icons/hicolor/22x22/mimetypes/application-x-generic.png",
        22,
        22,
        RED,
    );
    let mut loader = fixture.loader();

    let icon = loader
        .load_mime_type_icon("application/x-font-vfont", IconGroup::Desktop, 22, IconState::Default)
        .unwrap();
    assert!(!icon.was_unknown);
    assert!(icon.path.as_ref().unwrap().ends_with("application-x-generic.png"));
    assert_eq!(pixel(&icon, 0, 0), RED);
}

#[test]
fn test_generic_icon_from_registry() {
    let fixture = Fixture::new();
    fixture.write_file("mime/generic-icons", b"application/x-fancy:package-x-generic\n");
    fixture.write_png("icons/hicolor/22x22/mimetypes/package-x-generic.png", 22, 22, RED);
    let mut loader = fixture.loader();

    let icon = loader
        .load_mime_type_icon("application/x-fancy", IconGroup::Desktop, 22, IconState::Default)
        .unwrap();
    assert!(icon.path.unwrap().ends_with("package-x-generic.png"));
}

#[test]
fn test_missing_icon_is_rechecked_after_interval() {
    let fixture = Fixture::new();
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("late-icon", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.was_unknown);
    assert!(icon.path.is_none());
    assert_eq!(icon.pixmap.dimensions(), (22, 22));
    assert!(!loader.has_icon("late-icon"));

    fixture.write_png("icons/hicolor/22x22/apps/late-icon.png", 22, 22, GREEN);

    // Still inside the recheck interval
    let icon = loader
        .load_icon("late-icon", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.was_unknown);

    fixture.clock.advance(Duration::from_millis(5001));
    let icon = loader
        .load_icon("late-icon", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(!icon.was_unknown);
    assert!(icon.path.unwrap().ends_with("late-icon.png"));
    assert!(loader.has_icon("late-icon"));
}

#[test]
fn test_missing_icon_can_return_null() {
    let fixture = Fixture::new();
    let mut loader = fixture.loader();

    assert!(
        loader
            .load_icon("nothing-here", IconGroup::Toolbar, 0, IconState::Default, &[], true)
            .is_none()
    );
    assert!(
        loader
            .load_icon("nothing-here", IconGroup::Toolbar, 0, IconState::Default, &[], true)
            .is_none()
    );
    assert!(loader.icon_path("nothing-here", IconGroup::Toolbar, true).is_none());
}

#[test]
fn test_invalid_requests() {
    let fixture = Fixture::new();
    let mut loader = fixture.loader();

    assert!(loader.load_scaled_icon(&IconRequest::new("")).is_none());
    assert!(loader.load_scaled_icon(&IconRequest::new("kde").with_size(-4)).is_none());
    assert!(!loader.has_icon(""));
}

#[test]
fn test_svg_is_centered_with_aspect_ratio() {
    let fixture = Fixture::new();
    fixture.write_file(
        "icons/hicolor/scalable/apps/wide.svg",
        br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20"><rect width="40" height="20" fill="#ff0000"/></svg>"##,
    );
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("wide", IconGroup::Desktop, 40, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(icon.pixmap.dimensions(), (40, 40));
    for y in (0..10).chain(30..40) {
        for x in 0..40 {
            assert_eq!(pixel(&icon, x, y)[3], 0, "pixel ({x}, {y}) should be transparent");
        }
    }
    assert_eq!(pixel(&icon, 20, 20), RED);
}

#[test]
fn test_non_square_request_centers_square_icon() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    let mut loader = fixture.loader();

    let icon = loader
        .load_scaled_icon(&IconRequest::new("kde").with_dimensions(22, 26))
        .unwrap();
    assert_eq!(icon.pixmap.dimensions(), (22, 26));
    assert_eq!(pixel(&icon, 10, 1)[3], 0);
    assert_eq!(pixel(&icon, 10, 2), BLUE);
    assert_eq!(pixel(&icon, 10, 23), BLUE);
    assert_eq!(pixel(&icon, 10, 24)[3], 0);
}

#[test]
fn test_scale_multiplies_device_pixels() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/48x48/apps/kde.png", 48, 48, BLUE);
    let mut loader = fixture.loader();

    let icon = loader
        .load_scaled_icon(&IconRequest::new("kde").with_size(24).with_scale(2.0))
        .unwrap();
    assert_eq!(icon.pixmap.dimensions(), (48, 48));
    assert_eq!(icon.pixmap.device_pixel_ratio(), 2.0);
}

#[test]
fn test_group_size_used_when_size_is_zero() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    let mut loader = fixture.loader();

    assert_eq!(loader.current_size(IconGroup::Toolbar), 22);
    assert_eq!(loader.current_size(IconGroup::User), 0);

    let icon = loader
        .load_icon("kde", IconGroup::Toolbar, 0, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(icon.pixmap.dimensions(), (22, 22));
}

#[test]
fn test_color_scheme_recoloring() {
    let fixture = Fixture::new();
    fixture.write_theme("breeze", FOLLOWING_THEME, &["scalable/apps"]);
    fixture.write_file("icons/breeze/scalable/apps/colored.svg", COLORED_SVG.as_bytes());
    let mut loader = fixture.loader();
    assert!(loader.theme().unwrap().follows_color_scheme());

    let icon = loader
        .load_icon("colored", IconGroup::Desktop, 16, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&icon, 8, 8), [0x23, 0x26, 0x29, 255]);

    let selected = loader
        .load_icon("colored", IconGroup::Desktop, 16, IconState::Selected, &[], false)
        .unwrap();
    assert_eq!(pixel(&selected, 8, 8), [255, 255, 255, 255]);

    loader.set_custom_palette(ColorPalette {
        text: Color::rgb(255, 0, 0),
        ..ColorPalette::light()
    });
    let custom = loader
        .load_icon("colored", IconGroup::Desktop, 16, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&custom, 8, 8), RED);

    let request = IconRequest::new("colored").with_size(16).with_colors(ColorPalette {
        text: Color::rgb(0, 255, 0),
        ..ColorPalette::light()
    });
    assert_eq!(pixel(&loader.load_scaled_icon(&request).unwrap(), 8, 8), GREEN);

    loader.reset_palette();
    assert!(loader.custom_palette().is_none());
    let icon = loader
        .load_icon("colored", IconGroup::Desktop, 16, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&icon, 8, 8), [0x23, 0x26, 0x29, 255]);
}

#[test]
fn test_overlays_in_corners() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/32x32/apps/kde.png", 32, 32, BLUE);
    fixture.write_png("icons/hicolor/16x16/apps/emblem-locked.png", 16, 16, RED);
    fixture.write_png("icons/hicolor/16x16/apps/emblem-shared.png", 16, 16, GREEN);
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon(
            "kde",
            IconGroup::Desktop,
            32,
            IconState::Default,
            &["emblem-locked", "", "emblem-shared", "emblem-missing"],
            false,
        )
        .unwrap();

    // Bottom right, margin of two pixels
    assert_eq!(pixel(&icon, 20, 20), RED);
    assert_eq!(pixel(&icon, 31, 31), BLUE);
    // Bottom left stays free
    assert_eq!(pixel(&icon, 5, 28), BLUE);
    // Top left
    assert_eq!(pixel(&icon, 5, 5), GREEN);
    assert_eq!(pixel(&icon, 0, 0), BLUE);
}

#[test]
fn test_warm_cache_returns_identical_icon() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    let mut loader = fixture.loader();

    let first = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    let second = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(loader.cache().len(), 1);
    assert!(loader.cache().hit_rate() > 0.0);
}

#[test]
fn test_absolute_path_bypasses_themes() {
    let fixture = Fixture::new();
    let path = fixture.write_png("loose/picture.png", 10, 10, GREEN);
    let mut loader = fixture.loader();

    let name = path.to_str().unwrap();
    let icon = loader
        .load_icon(name, IconGroup::Desktop, 10, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(icon.path.as_deref(), Some(path.as_path()));
    assert_eq!(loader.icon_path(name, IconGroup::Desktop, false), Some(path));
}

#[test]
fn test_user_group_uses_loose_icon_dirs() {
    let fixture = Fixture::new();
    let pics = fixture.write_png("testapp/pics/splash.png", 12, 8, GREEN);
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("splash", IconGroup::User, 0, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(icon.path.as_deref(), Some(pics.as_path()));
    assert_eq!(icon.pixmap.dimensions(), (12, 8));
    assert_eq!(loader.icon_path("splash", IconGroup::User, true), Some(pics));
}

#[test]
fn test_fallback_search_paths() {
    let fixture = Fixture::new();
    let path = fixture.write_png("fallback/odd-one.png", 22, 22, RED);
    let config = fixture
        .config()
        .with_fallback_search_path(fixture.data.join("fallback"));
    let mut loader = fixture.loader_with(config);

    assert_eq!(loader.icon_path("odd-one", IconGroup::Desktop, true), Some(path));
}

#[test]
fn test_favicons() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/48x48/apps/text-html.png", 48, 48, BLUE);
    let favicon = fixture.write_png("cache/favicons/example.org.png", 16, 16, GREEN);
    let config = fixture.config().with_favicon_dir(fixture.data.join("cache"));
    let mut loader = fixture.loader_with(config);

    let large = loader
        .load_icon("favicons/example.org", IconGroup::Desktop, 48, IconState::Default, &[], false)
        .unwrap();
    assert!(large.path.as_ref().unwrap().ends_with("text-html.png"));
    assert_eq!(pixel(&large, 10, 10), BLUE);
    assert_eq!(pixel(&large, 40, 40), GREEN);
    assert_eq!(pixel(&large, 47, 47), BLUE);

    let small = loader
        .load_icon("favicons/example.org", IconGroup::Desktop, 16, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(small.path, Some(favicon));
    assert_eq!(pixel(&small, 8, 8), GREEN);
}

#[test]
fn test_inherited_theme_order() {
    let fixture = Fixture::new();
    fixture.write_theme(
        "child",
        "[Icon Theme]\nName=Child\nInherits=parent\nDirectories=22x22/apps\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
        &["22x22/apps"],
    );
    fixture.write_theme(
        "parent",
        "[Icon Theme]\nName=Parent\nDirectories=22x22/apps\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
        &["22x22/apps"],
    );
    fixture.write_png("icons/parent/22x22/apps/kde.png", 22, 22, GREEN);
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    let mut loader = fixture.loader_with(fixture.config().with_default_theme("child"));

    assert_eq!(loader.theme_names(), vec!["child", "parent", "hicolor"]);
    let icon = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.path.unwrap().ends_with("parent/22x22/apps/kde.png"));
}

#[test]
fn test_query_icons_deduplicates_names() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    fixture.write_png("icons/hicolor/22x22/apps/konsole.png", 22, 22, BLUE);
    fixture.write_png("icons/hicolor/22x22/mimetypes/text-plain.png", 22, 22, BLUE);
    let mut loader = fixture.loader();

    let apps = loader.query_icons(22, IconContext::Application);
    assert_eq!(apps.len(), 2);
    assert!(loader.has_context(IconContext::MimeType));
    assert!(!loader.has_context(IconContext::Emote));

    let all = loader.query_icons(22, IconContext::Any);
    assert_eq!(all.len(), 3);
}

#[test]
fn test_change_bus_reloads_other_loaders() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    fixture.write_theme(
        "other",
        "[Icon Theme]\nName=Other\nDirectories=22x22/apps\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
        &["22x22/apps"],
    );
    fixture.write_png("icons/other/22x22/apps/kde.png", 22, 22, GREEN);

    let subsystem = fixture.subsystem();
    let mut first = horizon_icons::IconLoader::with_subsystem(subsystem.clone(), "first", Vec::new());
    let mut second = horizon_icons::IconLoader::with_subsystem(subsystem.clone(), "second", Vec::new());

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    second.icon_changed().connect(move |group| {
        assert_eq!(*group, IconGroup::Desktop);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let icon = second
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&icon, 0, 0), BLUE);

    subsystem.force_theme_for_tests(Some("other"));
    first.emit_change(IconGroup::Desktop);

    let icon = second
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert_eq!(pixel(&icon, 0, 0), GREEN);
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(second.theme_names()[0], "other");

    assert!(first.process_changes());
    assert!(!first.process_changes());
}

#[test]
fn test_reconfigure_rereads_theme_name() {
    let fixture = Fixture::new();
    for (theme, color) in [("alpha", BLUE), ("beta", GREEN)] {
        fixture.write_theme(
            theme,
            "[Icon Theme]\nName=Theme\nDirectories=22x22/apps\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
            &["22x22/apps"],
        );
        fixture.write_png(&format!("icons/{theme}/22x22/apps/kde.png"), 22, 22, color);
    }
    let kdeglobals = fixture.write_file("kdeglobals", b"[Icons]\nTheme=alpha\n");
    let config = fixture
        .config()
        .with_global_settings(SettingsSource::File(kdeglobals.clone()));
    let mut loader = fixture.loader_with(config);

    let path = loader.icon_path("kde", IconGroup::Desktop, false).unwrap();
    assert!(path.ends_with("alpha/22x22/apps/kde.png"));

    std::fs::write(&kdeglobals, "[Icons]\nTheme=beta\n").unwrap();
    loader.reconfigure("testapp", Vec::new());

    assert_eq!(loader.theme_names()[0], "beta");
    let icon = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.path.as_ref().unwrap().ends_with("beta/22x22/apps/kde.png"));
    assert_eq!(pixel(&icon, 0, 0), GREEN);
}

#[test]
fn test_palette_change_rereads_theme_name() {
    let fixture = Fixture::new();
    fixture.write_theme(
        "beta",
        "[Icon Theme]\nName=Beta\nDirectories=22x22/apps\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
        &["22x22/apps"],
    );
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);
    fixture.write_png("icons/beta/22x22/apps/kde.png", 22, 22, GREEN);
    let kdeglobals = fixture.write_file("kdeglobals", b"[Icons]\nTheme=hicolor\n");
    let config = fixture
        .config()
        .with_global_settings(SettingsSource::File(kdeglobals.clone()));
    let mut loader = fixture.loader_with(config);
    assert_eq!(loader.theme_names()[0], "hicolor");

    std::fs::write(&kdeglobals, "[Icons]\nTheme=beta\n").unwrap();
    loader.reset_palette();
    assert_eq!(loader.theme_names()[0], "beta");
}

#[test]
fn test_add_app_dir_extends_tree() {
    let fixture = Fixture::new();
    fixture.write_png("otherapp/icons/hicolor/22x22/apps/app-only.png", 22, 22, GREEN);
    fixture.write_png("otherapp/pics/loose-pic.png", 8, 8, RED);
    let mut loader = fixture.loader();

    assert!(loader.icon_path("app-only", IconGroup::Desktop, true).is_none());

    loader.add_app_dir("otherapp", None);
    let path = loader.icon_path("app-only", IconGroup::Desktop, true).unwrap();
    assert!(path.ends_with("otherapp/icons/hicolor/22x22/apps/app-only.png"));
    assert!(loader.icon_path("loose-pic", IconGroup::User, true).is_some());

    // Survives a reload
    loader.reconfigure("testapp", Vec::new());
    assert!(loader.icon_path("app-only", IconGroup::Desktop, true).is_some());
}

#[test]
fn test_embedded_unknown_icon() {
    let fixture = Fixture::new();
    let mut loader = fixture.loader();

    let icon = loader
        .load_icon("does-not-exist", IconGroup::Small, 0, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.was_unknown);
    assert_eq!(icon.pixmap.dimensions(), (16, 16));
    assert!(icon.pixmap.as_raw().chunks(4).any(|px| px[3] > 0));
}
