//! User-facing text in English and Chinese.

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Zh,
            Language::Zh => Language::En,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Zh => "中文",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "zh" | "cn" | "chinese" => Some(Language::Zh),
            _ => None,
        }
    }
}

/// Picks the string for the active language.
fn pick(lang: Language, en: impl Into<String>, zh: impl Into<String>) -> String {
    match lang {
        Language::En => en.into(),
        Language::Zh => zh.into(),
    }
}

/// Message catalogue for one language.
#[derive(Clone, Copy, Debug)]
pub struct Text {
    lang: Language,
}

impl Text {
    pub fn new(lang: Language) -> Self {
        Self { lang }
    }

    pub fn title(&self) -> String {
        pick(self.lang, "Gacha Game", "扭蛋游戏")
    }

    pub fn balance(&self, balance: u64) -> String {
        pick(
            self.lang,
            format!("Balance: {balance} tokens"),
            format!("余额: {balance} 代币"),
        )
    }

    pub fn cost_per_play(&self, cost: u64) -> String {
        pick(
            self.lang,
            format!("Cost per play: {cost} tokens"),
            format!("每次游戏费用: {cost} 代币"),
        )
    }

    pub fn owned_dolls(&self, total: u64) -> String {
        pick(
            self.lang,
            format!("Owned dolls: {total}"),
            format!("拥有的娃娃: {total}"),
        )
    }

    pub fn unique_dolls(&self, unique: usize) -> String {
        pick(
            self.lang,
            format!("Unique dolls: {unique}"),
            format!("独特的娃娃: {unique}"),
        )
    }

    pub fn chain_balance(&self, symbol: &str, amount: Option<u128>) -> String {
        let amount = amount.unwrap_or(0);
        pick(
            self.lang,
            format!("{symbol} Balance: {amount}"),
            format!("{symbol} 余额: {amount}"),
        )
    }

    pub fn connect_wallet(&self) -> String {
        pick(self.lang, "Connect Wallet", "连接钱包")
    }

    pub fn insufficient_balance_title(&self) -> String {
        pick(self.lang, "Insufficient Balance", "余额不足")
    }

    pub fn insufficient_balance_body(&self) -> String {
        pick(
            self.lang,
            "You don't have enough tokens to play.",
            "您没有足够的代币来玩游戏。",
        )
    }

    pub fn success_title(&self) -> String {
        pick(self.lang, "Success", "成功")
    }

    pub fn you_got(&self, name: &str) -> String {
        pick(
            self.lang,
            format!("You got a {name}!"),
            format!("您获得了一个{name}！"),
        )
    }

    pub fn wallet_not_connected_title(&self) -> String {
        pick(self.lang, "Wallet Not Connected", "钱包未连接")
    }

    pub fn wallet_not_connected_body(&self) -> String {
        pick(
            self.lang,
            "Please connect your wallet to mint NFTs.",
            "请连接您的钱包以铸造NFT。",
        )
    }

    pub fn minting_title(&self) -> String {
        pick(self.lang, "Minting", "铸造中")
    }

    pub fn minting_body(&self, name: &str) -> String {
        pick(
            self.lang,
            format!("Waiting for your wallet to mint {name}..."),
            format!("正在等待钱包铸造{name}..."),
        )
    }

    pub fn mint_success_title(&self) -> String {
        pick(self.lang, "Minting Successful", "铸造成功")
    }

    pub fn mint_success_body(&self, name: &str) -> String {
        pick(
            self.lang,
            format!("You have minted {name} as an NFT and added it to your wallet!"),
            format!("您已将{name}铸造为NFT并添加到您的钱包中！"),
        )
    }

    pub fn mint_failed_title(&self) -> String {
        pick(self.lang, "Minting Failed", "铸造失败")
    }

    pub fn mint_failed_body(&self) -> String {
        pick(
            self.lang,
            "There was an error minting your NFT. The doll remains in your collection.",
            "铸造NFT时出错。娃娃仍保留在您的收藏中。",
        )
    }

    pub fn not_allowed_title(&self) -> String {
        pick(self.lang, "Not Allowed", "无法操作")
    }

    pub fn mint_as_nft(&self) -> String {
        pick(self.lang, "Mint as NFT", "铸造为NFT")
    }

    pub fn mint(&self) -> String {
        pick(self.lang, "Mint", "铸造")
    }

    pub fn mint_nft_title(&self) -> String {
        pick(self.lang, "Mint NFT", "铸造NFT")
    }

    pub fn mint_prompt(&self, name: &str) -> String {
        pick(
            self.lang,
            format!("Do you want to mint this {name} as an NFT and add it to your wallet?"),
            format!("您想将这个{name}铸造为NFT并添加到您的钱包中吗？"),
        )
    }

    pub fn yes(&self) -> String {
        pick(self.lang, "Yes", "是")
    }

    pub fn no(&self) -> String {
        pick(self.lang, "No", "否")
    }

    pub fn your_collection(&self) -> String {
        pick(self.lang, "Your Collection", "您的收藏")
    }

    pub fn spoiler_warning(&self) -> String {
        pick(self.lang, "Spoiler button, don't click!", "剧透按钮，别点！")
    }

    pub fn show_all(&self) -> String {
        pick(self.lang, "Show All", "显示全部")
    }

    pub fn hide_unowned(&self) -> String {
        pick(self.lang, "Hide Unowned", "隐藏未获得")
    }

    pub fn capsule_ready(&self) -> String {
        pick(
            self.lang,
            "A capsule dropped! Press Enter to open it.",
            "扭蛋掉出来了！按回车打开。",
        )
    }

    pub fn machine_idle(&self, cost: u64) -> String {
        pick(
            self.lang,
            format!("Press Space to turn the knob ({cost} tokens)"),
            format!("按空格键转动旋钮（{cost} 代币）"),
        )
    }

    pub fn capsules_left(&self, count: u32) -> String {
        pick(
            self.lang,
            format!("Capsules left: {count}"),
            format!("剩余扭蛋: {count}"),
        )
    }

    pub fn empty_collection(&self) -> String {
        pick(self.lang, "No dolls yet", "还没有娃娃")
    }

    pub fn mint_reminder(&self) -> String {
        pick(
            self.lang,
            "Remember, NFTs that have already been minted cannot be minted again to your wallet. Don't waste your gas fees!",
            "请记住，已经铸造过的NFT无法重复铸造到你的钱包中哦，请不要浪费你的 gas 费用！",
        )
    }

    pub fn quit_prompt(&self) -> String {
        pick(self.lang, "Quit the game? (Y/N)", "退出游戏？(Y/N)")
    }

    pub fn help(&self) -> String {
        pick(
            self.lang,
            "space spin | enter open | ←/→ select | m mint | v show all | g language | q quit",
            "空格 转动 | 回车 打开 | ←/→ 选择 | m 铸造 | v 显示全部 | g 语言 | q 退出",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_start() {
        assert_eq!(Language::En.toggled(), Language::Zh);
        assert_eq!(Language::En.toggled().toggled(), Language::En);
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Language::parse("EN"), Some(Language::En));
        assert_eq!(Language::parse("zh"), Some(Language::Zh));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn messages_follow_language() {
        assert_eq!(Text::new(Language::En).balance(900), "Balance: 900 tokens");
        assert_eq!(Text::new(Language::Zh).balance(900), "余额: 900 代币");
        assert_eq!(Text::new(Language::En).you_got("Rabbit"), "You got a Rabbit!");
        assert_eq!(Text::new(Language::Zh).you_got("Rabbit"), "您获得了一个Rabbit！");
    }
}
