use eobicho_admin_core::{
    BridgeMessage, BridgeReporter, ContentMetrics, DefaultTab, DocumentExtent, ElementBox,
    FrameDirective, HrefResolver, ModalCandidate, OpenOutcome, ShellConfig, TabId, TabRegistry,
    decode_envelope, encode_envelope, frame_directive, measure,
};
use quickcheck::{QuickCheck, TestResult};

const BASE: &str = "https://loja.eobicho.com.br/pages/admin.html";

fn shell() -> TabRegistry {
    let config = ShellConfig::for_tests();
    let resolver =
        HrefResolver::new(BASE, config.tab_path_prefixes.clone()).expect("base url parses");
    TabRegistry::new(
        resolver,
        DefaultTab::new("/pages/admin.html", config.default_tab_label.clone()),
    )
    .with_new_tab_label(&config.new_tab_label)
}

#[test]
fn embedded_marker_does_not_duplicate_tabs() {
    let mut registry = shell();

    let first = registry.open("/pages/admin/produtos", "Produtos");
    let OpenOutcome::Created { record, .. } = first else {
        panic!("expected a new tab, got {first:?}");
    };
    assert_eq!(record.id.as_str(), "tab-1");

    let second = registry.open("/pages/admin/produtos?embedded=1", "Produtos");
    assert_eq!(
        second,
        OpenOutcome::Activated {
            id: TabId::from("tab-1")
        }
    );

    assert_eq!(registry.len(), 2);
    assert!(registry.get(&TabId::dashboard()).is_some());
    assert_eq!(registry.active_id(), Some(&TabId::from("tab-1")));
    registry.check_invariants().expect("consistent");
}

#[test]
fn closing_active_tab_falls_back_to_previous_mru() {
    let mut registry = shell();
    registry.open("/pages/admin/produtos", "Produtos");
    registry.open("/pages/admin/servicos", "Serviços");
    assert_eq!(registry.active_id(), Some(&TabId::from("tab-2")));

    let outcome = registry.close(&TabId::from("tab-2")).expect("closes");
    assert_eq!(outcome.activated, Some(TabId::from("tab-1")));
    assert_eq!(registry.active_id(), Some(&TabId::from("tab-1")));
    assert_eq!(registry.len(), 2);
}

#[test]
fn dashboard_survives_close_requests() {
    let mut registry = shell();
    registry.open("/pages/admin/produtos", "Produtos");
    let before = registry.get(&TabId::dashboard()).cloned();

    assert_eq!(registry.close(&TabId::dashboard()), None);
    assert_eq!(registry.get(&TabId::dashboard()).cloned(), before);
    assert_eq!(registry.active_id(), Some(&TabId::from("tab-1")));
}

#[test]
fn embedded_page_reports_reach_shell_as_frame_directives() {
    let mut reporter = BridgeReporter::default();
    let document = DocumentExtent {
        scrolling_scroll_height: 900.0,
        scrolling_offset_height: 900.0,
        body_scroll_height: Some(880.0),
        body_offset_height: Some(880.0),
    };
    let modal = ModalCandidate {
        dialog: ElementBox {
            rect_top: 200.0,
            rect_width: 640.0,
            rect_height: 1000.0,
            scroll_height: 1000.0,
            ..ElementBox::default()
        },
        shell: None,
    };

    let metrics = measure(&document, 0.0, &[modal]);
    assert_eq!(metrics.modal_extent, 1216.0);

    let posted = reporter
        .on_mutation(true, metrics)
        .iter()
        .map(encode_envelope)
        .collect::<Vec<_>>();
    assert_eq!(posted.len(), 2);

    let received = posted
        .iter()
        .map(|value| decode_envelope(value).expect("shell accepts bridge output"))
        .collect::<Vec<_>>();
    assert_eq!(received[0], BridgeMessage::ModalOpen(metrics));
    assert_eq!(
        frame_directive(&received[0], 640.0, 16.0),
        FrameDirective::SetHeight {
            px: 1232.0,
            modal_open: Some(true)
        }
    );

    let steady = reporter.on_mutation(true, metrics);
    assert!(
        steady
            .iter()
            .all(|message| matches!(message, BridgeMessage::ContentResize(_)))
    );

    let closed = reporter.on_mutation(false, measure(&document, 0.0, &[]));
    assert_eq!(
        frame_directive(&closed[0], 640.0, 16.0),
        FrameDirective::Reset
    );
    assert_eq!(
        closed[1],
        BridgeMessage::ContentResize(ContentMetrics {
            height: 900.0,
            doc_height: 900.0,
            modal_extent: 0.0,
            modal_height: 0.0,
        })
    );
}

const DESTINATIONS: [&str; 6] = [
    "/pages/admin/produtos",
    "/pages/admin/servicos?grupo=2",
    "/pages/funcionarios/agenda",
    "/pages/admin/icms",
    "/pages/carrinho.html",
    "/pages/admin/bancos#contas",
];

fn registry_stays_deduplicated(ops: Vec<(u8, bool, bool)>) -> TestResult {
    let mut registry = shell();
    for (pick, embedded, close_active) in ops {
        let destination = DESTINATIONS[usize::from(pick) % DESTINATIONS.len()];
        if close_active {
            if let Some(active) = registry.active_id().cloned() {
                registry.close(&active);
            }
            continue;
        }
        let href = if embedded {
            let (path, fragment) = destination.split_once('#').unwrap_or((destination, ""));
            let separator = if path.contains('?') { '&' } else { '?' };
            if fragment.is_empty() {
                format!("{path}{separator}embedded=1")
            } else {
                format!("{path}{separator}embedded=1#{fragment}")
            }
        } else {
            destination.to_string()
        };
        registry.open(&href, "Aba");

        if registry.check_invariants().is_err() {
            return TestResult::failed();
        }
    }

    let mut hrefs = registry
        .iter_mru()
        .map(|tab| tab.href.clone())
        .collect::<Vec<_>>();
    let total = hrefs.len();
    hrefs.sort();
    hrefs.dedup();
    TestResult::from_bool(hrefs.len() == total && registry.get(&TabId::dashboard()).is_some())
}

#[test]
fn at_most_one_tab_per_destination() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(registry_stays_deduplicated as fn(Vec<(u8, bool, bool)>) -> TestResult);
}
