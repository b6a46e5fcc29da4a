use cf_api::{create_player_from_xml, CreatePlayerFromXmlOptions};
use cf_core::{Binding, ElementKind, FunnelError, PhaseId};
use cf_runtime::{FunnelHost, FunnelPlayer};

use crate::source_loader::DEFAULT_BUILTIN_FUNNEL;
use crate::LoadedFunnels;

/// Host for terminal sessions. Links cannot be opened from here, so they are
/// only logged; the player still reports them as opened.
#[derive(Debug, Default)]
pub(crate) struct TerminalHost;

impl FunnelHost for TerminalHost {
    fn open_url(&mut self, url: &str) -> Result<(), FunnelError> {
        tracing::info!(url, "link handed to the terminal");
        Ok(())
    }

    fn on_interaction(&mut self) {
        tracing::debug!("first interaction");
    }

    fn on_restart(&mut self) {
        tracing::debug!("playthrough restarted");
    }
}

pub(crate) fn create_player_for_source(
    loaded: &LoadedFunnels,
    entry_phase: Option<&str>,
) -> Result<FunnelPlayer, FunnelError> {
    let funnel = loaded
        .funnel
        .clone()
        .or_else(|| loaded.builtin.then(|| DEFAULT_BUILTIN_FUNNEL.to_string()));
    create_player_from_xml(CreatePlayerFromXmlOptions {
        funnels_xml: loaded.funnels_xml.clone(),
        funnel,
        entry_phase: entry_phase.map(PhaseId::from),
        route_delay_ms: None,
        host: Some(Box::new(TerminalHost)),
    })
}

/// Binding of the `slot`-th control on the newest pricing offer.
pub(crate) fn pricing_binding(player: &FunnelPlayer, slot: usize) -> Option<Binding> {
    player
        .transcript()
        .iter()
        .rev()
        .find(|entry| entry.element.kind == ElementKind::PricingOffer)
        .and_then(|entry| entry.element.controls.get(slot))
        .map(|control| control.binding.clone())
}

#[cfg(test)]
mod session_ops_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::source_loader::load_builtin_source;

    #[test]
    fn builtin_source_defaults_to_mentoring() {
        let player =
            create_player_for_source(&load_builtin_source(None), None).expect("player builds");
        assert_eq!(player.table().name, "mentoring");
        assert_eq!(player.entry_phase().as_str(), "1");

        let quick = create_player_for_source(&load_builtin_source(Some("quickstart".into())), None)
            .expect("player builds");
        assert_eq!(quick.entry_phase().as_str(), "welcome");
    }

    #[test]
    fn unknown_entry_phase_is_rejected() {
        let error = create_player_for_source(&load_builtin_source(None), Some("99"))
            .err()
            .expect("unknown entry should fail");
        assert_eq!(error.code, "API_ENTRY_PHASE_NOT_FOUND");
    }

    #[test]
    fn pricing_binding_reads_newest_offer_controls() {
        let mut player = tiny_player();
        assert_eq!(pricing_binding(&player, 0), None);

        player.load_phase("offer");
        player.run_until_idle();
        assert_eq!(
            pricing_binding(&player, 0),
            Some(Binding::OpenLink {
                url: "https://pay.example/checkout".to_string()
            })
        );
        assert_eq!(
            pricing_binding(&player, 1),
            Some(Binding::OpenLink {
                url: "https://chat.example/community".to_string()
            })
        );
        assert_eq!(pricing_binding(&player, 2), None);
    }
}
