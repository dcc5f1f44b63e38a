use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use switch_policy::{CallPolicy, ChannelState, CommandSpec, InvocationContext};
use switch_runtime::{
    AttachOutcome, DispatchHook, Invocation, SwitchCaller, SwitchConfigFile, SwitchLocale,
    SwitchRuntime, SwitchSettings,
};
use switch_store::{
    ChannelRecord, ChannelStore, InMemoryChannelStore, JsonFileChannelStore, StoreResult,
};

const CHANNEL: &str = "mock:321";

/// Store wrapper counting durable writes.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryChannelStore,
    saves: AtomicUsize,
}

#[async_trait]
impl ChannelStore for CountingStore {
    async fn load(&self, channel_id: &str) -> StoreResult<Option<ChannelRecord>> {
        self.inner.load(channel_id).await
    }

    async fn save(&self, channel_id: &str, state: &ChannelState) -> StoreResult<ChannelRecord> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(channel_id, state).await
    }
}

/// Minimal chat host: dispatches `switch` to the runtime and other commands to fixed replies.
struct MockBot<S: ChannelStore> {
    runtime: SwitchRuntime<S>,
    replies: BTreeMap<&'static str, &'static str>,
    authority: u32,
}

impl<S: ChannelStore> MockBot<S> {
    async fn send(&self, text: &str) -> Result<Option<String>> {
        let Some((literal, args)) = self.runtime.settings().split_invocation(text) else {
            return Ok(None);
        };
        let invocation = Invocation {
            channel_id: Some(CHANNEL.to_string()),
            command: literal.to_string(),
            context: InvocationContext::channel(literal),
        };
        if self.runtime.on_attach(&invocation).await? == AttachOutcome::SuppressResponse {
            return Ok(None);
        }
        if literal == "switch" {
            let caller = SwitchCaller::in_channel(CHANNEL, self.authority);
            let reply = self.runtime.execute_switch(&caller, args).await?;
            return Ok(Some(reply.text));
        }
        let command = self
            .runtime
            .settings()
            .registry
            .lookup(literal)
            .map(|command| command.name.as_str());
        Ok(command
            .and_then(|name| self.replies.get(name))
            .map(|reply| reply.to_string()))
    }

    async fn should_reply(&self, text: &str, expected: &str) {
        let reply = self.send(text).await.expect("dispatch");
        assert_eq!(reply.as_deref(), Some(expected), "input: {text}");
    }

    async fn should_not_reply(&self, text: &str) {
        let reply = self.send(text).await.expect("dispatch");
        assert_eq!(reply, None, "input: {text}");
    }
}

fn settings() -> SwitchSettings {
    SwitchSettings::from_config(SwitchConfigFile {
        locale: SwitchLocale::ZhCn,
        commands: vec![
            CommandSpec::new("foo").with_authority(4),
            CommandSpec::new("baz"),
            CommandSpec::new("bar"),
            CommandSpec::new("dis").with_call_policy(CallPolicy::Disabled),
            CommandSpec::new("chat.gpt"),
            CommandSpec::new("chat.local").with_call_policy(CallPolicy::Disabled),
        ],
        mutually_exclusive_groups: vec![vec!["chat.gpt".to_string(), "chat.local".to_string()]],
        ..SwitchConfigFile::default()
    })
    .expect("settings")
}

async fn bot() -> MockBot<CountingStore> {
    let store = CountingStore::default();
    store.attach(CHANNEL).await.expect("attach channel");
    MockBot {
        runtime: SwitchRuntime::new(settings(), store),
        replies: BTreeMap::from([("baz", "zab"), ("bar", "rab"), ("dis", "dis")]),
        authority: 3,
    }
}

#[tokio::test]
async fn integration_basic_toggle_hides_and_restores_command() {
    let bot = bot().await;
    bot.should_reply("switch -c mock:123", "未找到指定的频道。").await;
    bot.should_reply("switch", "当前没有启用或禁用功能。").await;
    bot.should_reply("baz", "zab").await;
    bot.should_reply("switch baz", "已禁用 baz 功能。").await;
    bot.should_reply("switch", "当前禁用的功能有：baz").await;
    bot.should_not_reply("baz").await;
    bot.should_reply("switch baz", "已启用 baz 功能。").await;
    bot.should_reply("baz", "zab").await;
    bot.should_reply("switch foo", "您无权修改 foo 功能。").await;
    bot.should_reply("switch bar", "已禁用 bar 功能。").await;
    bot.should_not_reply("bar -x 1").await;
    bot.should_reply("switch", "当前禁用的功能有：bar").await;
}

#[tokio::test]
async fn integration_disabled_by_default_requires_channel_opt_in() {
    let bot = bot().await;
    bot.should_not_reply("dis").await;
    bot.should_reply("switch dis", "已启用 dis 功能。").await;
    bot.should_reply("dis", "dis").await;
    bot.should_reply("switch", "当前启用的功能有：dis").await;
    bot.should_reply("switch baz", "已禁用 baz 功能。").await;
    bot.should_reply("switch", "当前启用的功能有：dis\n当前禁用的功能有：baz")
        .await;
    bot.should_reply("switch -e", "当前启用的功能有：dis").await;
    bot.should_reply("switch -d", "当前禁用的功能有：baz").await;
    bot.should_reply("switch dis baz", "已启用 baz 功能, 禁用 dis 功能。")
        .await;
    bot.should_not_reply("dis").await;
    bot.should_reply("baz", "zab").await;
}

#[tokio::test]
async fn integration_force_and_reset_options_report_unchanged() {
    let bot = bot().await;
    bot.should_reply("switch -d dis", "无任何更改。").await;
    bot.should_reply("switch -e bar", "无任何更改。").await;
    bot.should_reply("switch -e foo", "您无权修改 foo 功能。").await;
    bot.should_reply("switch -r dis bar", "无任何更改。").await;
    bot.should_reply("switch dis bar", "已启用 dis 功能, 禁用 bar 功能。")
        .await;
    bot.should_reply("switch -e dis", "无任何更改。").await;
    bot.should_reply("switch -d bar", "无任何更改。").await;
    bot.should_reply("switch -r dis bar", "已启用 bar 功能, 禁用 dis 功能。")
        .await;
    bot.should_reply("switch", "当前没有启用或禁用功能。").await;
}

#[tokio::test]
async fn integration_conflicting_options_never_mutate() {
    let bot = bot().await;
    let saves_before = bot.runtime.store().saves.load(Ordering::SeqCst);
    for input in [
        "switch -d -r dis",
        "switch -d -e dis",
        "switch -e -r dis",
        "switch -d -e -r dis",
        "switch -R -e",
    ] {
        bot.should_reply(input, "选项冲突。").await;
    }
    assert_eq!(bot.runtime.store().saves.load(Ordering::SeqCst), saves_before);
}

#[tokio::test]
async fn integration_reset_hint_and_reset_all() {
    let bot = bot().await;
    bot.should_reply("switch -r", "当前没有启用或禁用功能。").await;
    bot.should_reply("switch dis bar", "已启用 dis 功能, 禁用 bar 功能。")
        .await;
    bot.should_reply(
        "switch -r",
        "当前启用的功能有：dis\n当前禁用的功能有：bar\n要重置所有功能, 使用-R参数。",
    )
    .await;
    bot.should_reply("switch -R", "已重置所有功能。").await;
    bot.should_reply("switch -r", "当前没有启用或禁用功能。").await;
}

#[tokio::test]
async fn integration_forbidden_batch_leaves_record_untouched() {
    let bot = bot().await;
    bot.should_reply("switch baz", "已禁用 baz 功能。").await;
    let before = bot
        .runtime
        .store()
        .load(CHANNEL)
        .await
        .expect("load")
        .expect("record");
    let saves_before = bot.runtime.store().saves.load(Ordering::SeqCst);

    bot.should_reply("switch bar foo ghost", "您无权修改 foo, ghost 功能。")
        .await;

    let after = bot
        .runtime
        .store()
        .load(CHANNEL)
        .await
        .expect("load")
        .expect("record");
    assert_eq!(after, before);
    assert_eq!(bot.runtime.store().saves.load(Ordering::SeqCst), saves_before);
}

#[tokio::test]
async fn integration_channel_option_edits_only_the_target_channel() {
    let bot = bot().await;
    let other = "mock:654";
    bot.runtime
        .store()
        .attach(other)
        .await
        .expect("attach other channel");
    let current_before = bot
        .runtime
        .store()
        .load(CHANNEL)
        .await
        .expect("load")
        .expect("record");

    bot.should_reply("switch -c mock:654 baz", "已禁用 baz 功能。").await;
    bot.should_reply("switch -c mock:654", "当前禁用的功能有：baz").await;

    let target = bot
        .runtime
        .store()
        .load(other)
        .await
        .expect("load")
        .expect("record");
    assert_eq!(target.disable, vec!["baz".to_string()]);
    assert!(target.enable.is_empty());
    let current_after = bot
        .runtime
        .store()
        .load(CHANNEL)
        .await
        .expect("load")
        .expect("record");
    assert_eq!(current_after, current_before);
    bot.should_reply("baz", "zab").await;
}

#[tokio::test]
async fn integration_each_applied_batch_saves_exactly_once() {
    let bot = bot().await;
    let saves_before = bot.runtime.store().saves.load(Ordering::SeqCst);
    bot.should_reply("switch chat.local", "已启用 chat.local 功能, 禁用 chat.gpt 功能。")
        .await;
    assert_eq!(
        bot.runtime.store().saves.load(Ordering::SeqCst),
        saves_before + 1
    );
    bot.should_reply("switch -e chat.local", "无任何更改。").await;
    assert_eq!(
        bot.runtime.store().saves.load(Ordering::SeqCst),
        saves_before + 1
    );
    bot.should_reply("switch", "当前启用的功能有：chat.local\n当前禁用的功能有：chat.gpt")
        .await;
}

#[tokio::test]
async fn integration_json_store_backs_runtime_across_restarts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let caller = SwitchCaller::in_channel(CHANNEL, 3);

    let first = SwitchRuntime::new(settings(), JsonFileChannelStore::for_state_dir(temp.path()));
    let reply = first
        .execute_switch(&caller, "dis bar")
        .await
        .expect("switch");
    assert_eq!(reply.text, "已启用 dis 功能, 禁用 bar 功能。");

    let second = SwitchRuntime::new(settings(), JsonFileChannelStore::for_state_dir(temp.path()));
    let listing = second.execute_switch(&caller, "").await.expect("list");
    assert_eq!(listing.text, "当前启用的功能有：dis\n当前禁用的功能有：bar");
    let allowed = second
        .check_invocation(Some(CHANNEL), "/dis", false)
        .await
        .expect("check")
        .expect("registered");
    assert!(allowed.decision.is_allowed());
}
