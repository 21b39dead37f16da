/// Languages the help overlay and reply button are translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ja,
    Fr,
}

impl Locale {
    /// Map a language tag (`ja`, `fr-CA`, `EN_us`, ...) to a supported
    /// locale by its primary subtag, defaulting to English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "ja" => Locale::Ja,
            "fr" => Locale::Fr,
            _ => Locale::En,
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::En => &EN,
            Locale::Ja => &JA,
            Locale::Fr => &FR,
        }
    }
}

#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub key: &'static str,
    pub action: &'static str,
    pub home: &'static str,
    pub my_page: &'static str,
    pub new_issue: &'static str,
    pub search: &'static str,
    pub project_jump: &'static str,
    pub issue_list: &'static str,
    pub activity: &'static str,
    pub wiki: &'static str,
    pub scroll_top: &'static str,
    pub scroll_bottom: &'static str,
    pub reply: &'static str,
    pub edit: &'static str,
    pub copy: &'static str,
    pub preview: &'static str,
    pub submit: &'static str,
    pub navigation: &'static str,
    pub toggle: &'static str,
    pub open: &'static str,
    pub new_tab: &'static str,
    pub escape: &'static str,
    pub help: &'static str,
    pub reply_button: &'static str,
}

static EN: Labels = Labels {
    title: "Keyboard Shortcuts",
    key: "Key",
    action: "Action",
    home: "Go to home",
    my_page: "Go to my page",
    new_issue: "Create new issue",
    search: "Search",
    project_jump: "Project jump",
    issue_list: "Go to issues list",
    activity: "Go to activity",
    wiki: "Go to Wiki",
    scroll_top: "Scroll to top",
    scroll_bottom: "Scroll to bottom",
    reply: "Reply (issue detail page)",
    edit: "Edit issue + description",
    copy: "Copy issue",
    preview: "Toggle Edit/Preview",
    submit: "Submit form",
    navigation: "Navigate (issues / search results)",
    toggle: "Toggle issue selection",
    open: "1 checked → open\n2+ checked → bulk edit",
    new_tab: "Open in new tab",
    escape: "Clear selection (twice to uncheck all)\nBlur input field when focused",
    help: "Show help",
    reply_button: "Reply",
};

static JA: Labels = Labels {
    title: "キーボードショートカット",
    key: "キー",
    action: "アクション",
    home: "ホームへ移動",
    my_page: "マイページへ移動",
    new_issue: "新しいチケット",
    search: "検索",
    project_jump: "プロジェクトジャンプ",
    issue_list: "チケット一覧",
    activity: "アクティビティ",
    wiki: "Wiki",
    scroll_top: "最上へスクロール",
    scroll_bottom: "最下へスクロール",
    reply: "返信（チケット詳細ページ）",
    edit: "編集 + 説明編集",
    copy: "チケットをコピー",
    preview: "プレビュー切替",
    submit: "送信（フォーム）",
    navigation: "選択移動（チケット / 検索結果）",
    toggle: "チケット選択 ON / OFF",
    open: "チェック1件 → 開く\nチェック2件以上 → 一括編集",
    new_tab: "新しいタブで開く",
    escape: "選択解除（2回で全解除）\n入力中はフォーカス解除",
    help: "ヘルプ表示",
    reply_button: "返信",
};

static FR: Labels = Labels {
    title: "Raccourcis clavier",
    key: "Touche",
    action: "Action",
    home: "Aller à l'accueil",
    my_page: "Aller à ma page",
    new_issue: "Créer une nouvelle demande",
    search: "Rechercher",
    project_jump: "Saut de projet",
    issue_list: "Liste des demandes",
    activity: "Activité",
    wiki: "Wiki",
    scroll_top: "Défiler vers le haut",
    scroll_bottom: "Défiler vers le bas",
    reply: "Répondre (page détail)",
    edit: "Éditer + description",
    copy: "Copier la demande",
    preview: "Basculer Édition/Aperçu",
    submit: "Soumettre le formulaire",
    navigation: "Naviguer (demandes / résultats)",
    toggle: "Sélectionner/désélectionner",
    open: "1 cochée → ouvrir\n2+ cochées → édition en masse",
    new_tab: "Ouvrir dans un nouvel onglet",
    escape: "Effacer la sélection (2× pour tout décocher)\nPerdre le focus en saisie",
    help: "Afficher l'aide",
    reply_button: "Répondre",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_subtag_selects_locale() {
        assert_eq!(Locale::from_tag("ja"), Locale::Ja);
        assert_eq!(Locale::from_tag("ja-JP"), Locale::Ja);
        assert_eq!(Locale::from_tag("FR_ca"), Locale::Fr);
        assert_eq!(Locale::from_tag("en-GB"), Locale::En);
    }

    #[test]
    fn unknown_or_empty_tags_fall_back_to_english() {
        assert_eq!(Locale::from_tag(""), Locale::En);
        assert_eq!(Locale::from_tag("de-DE"), Locale::En);
        // Only the primary subtag counts, unlike a bare prefix test
        assert_eq!(Locale::from_tag("jav"), Locale::En);
    }

    #[test]
    fn tables_are_translated() {
        assert_eq!(Locale::Ja.labels().reply_button, "返信");
        assert_eq!(Locale::Fr.labels().title, "Raccourcis clavier");
        assert_eq!(Locale::En.labels().open.lines().count(), 2);
    }
}
