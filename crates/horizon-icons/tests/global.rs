//! The process wide subsystem. Kept in its own test binary since it
//! registers global state.

mod common;

use common::{BLUE, Fixture};
use horizon_icons::{
    Error, IconGroup, IconLoader, IconState, IconSubsystem, init_icon_subsystem,
    shutdown_icon_subsystem,
};

#[test]
fn test_global_subsystem_lifecycle() {
    let fixture = Fixture::new();
    fixture.write_png("icons/hicolor/22x22/apps/kde.png", 22, 22, BLUE);

    assert!(IconSubsystem::try_global().is_none());
    init_icon_subsystem(fixture.config()).unwrap();
    assert!(matches!(
        init_icon_subsystem(fixture.config()),
        Err(Error::AlreadyInitialized)
    ));

    let mut loader = IconLoader::new("globalapp", Vec::new());
    assert_eq!(loader.app_name(), "globalapp");
    let icon = loader
        .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
        .unwrap();
    assert!(icon.path.unwrap().ends_with("hicolor/22x22/apps/kde.png"));

    let registered = IconSubsystem::try_global().unwrap();
    assert!(std::sync::Arc::ptr_eq(&registered, loader.subsystem()));

    assert!(shutdown_icon_subsystem());
    assert!(!shutdown_icon_subsystem());
    assert!(IconSubsystem::try_global().is_none());

    // Loaders keep their subsystem alive after shutdown
    assert!(
        loader
            .load_icon("kde", IconGroup::Desktop, 22, IconState::Default, &[], false)
            .is_some()
    );
}
