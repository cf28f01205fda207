use vfs::{
    PathComponent, file_name, normalize_path, parent_path, parse_path, path_depth, resolve_path,
};

#[test]
fn test_normalize_path_absolute() {
    assert_eq!(normalize_path("/flash/dir"), "/flash/dir");
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path("///flash///dir///"), "/flash/dir");
}

#[test]
fn test_normalize_path_current() {
    assert_eq!(normalize_path("/flash/./dir"), "/flash/dir");
    assert_eq!(normalize_path("./dir"), "dir");
    assert_eq!(normalize_path("."), ".");
}

#[test]
fn test_normalize_path_parent() {
    assert_eq!(normalize_path("/sd/dev1/.."), "/sd");
    assert_eq!(normalize_path("/sd/../flash"), "/flash");
    assert_eq!(normalize_path("/.."), "/");
    assert_eq!(normalize_path("/../.."), "/");
}

#[test]
fn test_normalize_path_relative() {
    assert_eq!(normalize_path("dir/sub"), "dir/sub");
    assert_eq!(normalize_path("dir/../sub"), "sub");
    assert_eq!(normalize_path("../dir"), "../dir");
    assert_eq!(normalize_path("../../dir"), "../../dir");
}

#[test]
fn test_normalize_path_empty() {
    assert_eq!(normalize_path(""), ".");
}

#[test]
fn test_resolve_path() {
    assert_eq!(resolve_path("/", "flash"), "/flash");
    assert_eq!(resolve_path("/flash", "dir/../file.txt"), "/flash/file.txt");
    assert_eq!(resolve_path("/flash", "/sd"), "/sd");
    assert_eq!(resolve_path("/flash", ".."), "/");
    assert_eq!(resolve_path("/", "../.."), "/");
    assert_eq!(resolve_path("/flash", ""), "/flash");
}

#[test]
fn test_parent_and_file_name() {
    assert_eq!(parent_path("/sd/dev1"), "/sd");
    assert_eq!(parent_path("/flash"), "/");
    assert_eq!(parent_path("/"), "/");
    assert_eq!(file_name("/sd/dev1"), Some("dev1"));
    assert_eq!(file_name("/flash/"), Some("flash"));
    assert_eq!(file_name("/"), None);
}

#[test]
fn test_path_depth() {
    assert_eq!(path_depth("/"), 0);
    assert_eq!(path_depth("/flash"), 1);
    assert_eq!(path_depth("/sd/dev1"), 2);
}

#[test]
fn test_parse_path_components() {
    let components = parse_path("/flash/../sd/./dev1");
    assert_eq!(
        components,
        vec![
            PathComponent::Root,
            PathComponent::Normal("flash".to_string()),
            PathComponent::Parent,
            PathComponent::Normal("sd".to_string()),
            PathComponent::Current,
            PathComponent::Normal("dev1".to_string()),
        ]
    );
}
