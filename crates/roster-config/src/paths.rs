use std::path::PathBuf;

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

pub fn get_config_dir() -> PathBuf {
    home_dir().join(".config").join("roster")
}

pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

pub fn get_data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("roster")
}

pub fn get_default_data_file() -> PathBuf {
    get_data_dir().join("users.json")
}
