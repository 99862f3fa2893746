//! Fixed reply texts and command trigger keywords.
//!
//! The bot speaks Japanese; every user-facing string lives here so handlers only deal
//! with formatting arguments.

// Trigger keywords (substring matched, see `interaction::command`).

pub const ADD_TRIGGERS: &[&str] = &["追加"];
pub const DELETE_GROUP_TRIGGERS: &[&str] = &["グループ削除", "グループを削除"];
pub const REMOVE_TRIGGERS: &[&str] = &["削除"];
pub const SHOW_ALL_TRIGGERS: &[&str] = &["一覧", "全部表示", "すべて表示"];
pub const SHOW_TRIGGERS: &[&str] = &["表示", "メンバーは"];
pub const RENAME_TRIGGERS: &[&str] = &["名前変更", "名前を変更", "リネーム"];
pub const CC_TRIGGERS: &[&str] = &["メンション", "めんしょん", "ccして", "CCして"];

// Replies.

pub fn created(group: &str) -> String {
    format!("{group} は存在しないので作成しました\n")
}

pub fn members_updated(group: &str, names: &str) -> String {
    format!("{group} のメンバーは\n {names} に更新されました")
}

pub fn members_are(group: &str, names: &str) -> String {
    format!("{group} のメンバーは\n {names} です")
}

pub fn not_found(group: &str) -> String {
    format!("{group} は存在しません")
}

pub fn deleted(group: &str) -> String {
    format!("{group} を削除しました")
}

pub fn renamed(from: &str, to: &str) -> String {
    format!("{from} を {to} に変更しました")
}

pub fn cc(group: &str) -> String {
    format!("{group} にccします")
}

pub fn listing_header() -> String {
    "登録されているグループ:".to_string()
}

pub fn listing_line(group: &str, names: &str) -> String {
    format!("{group}: {names}")
}

pub fn listing_empty() -> String {
    "グループは登録されていません".to_string()
}

pub fn group_required(marker: char) -> String {
    format!("グループ名を {marker}グループ名 の形式で指定してください")
}

pub fn rename_requires_two(marker: char) -> String {
    format!("変更前と変更後のグループ名を {marker}変更前 {marker}変更後 の形式で指定してください")
}

pub fn persist_failed(err: &anyhow::Error) -> String {
    format!("\nメンバー更新に失敗しました.\nerr:{err}")
}
