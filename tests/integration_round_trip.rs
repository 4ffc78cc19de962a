#[cfg(test)]
mod tests {
    use indoc::indoc;
    use page_layout::xml::{self, Document, PlaceholderIds};
    use page_layout::{
        CodecError, DirStore, InsertDirection, LayoutStore, SessionError, StoreError,
        TemplateSession, Widget,
    };

    const TEMPLATE: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <Template>
          <id>101</id>
          <name>Landing &amp; promo</name>
          <regionTree>
            <region>
              <regionId>container</regionId>
              <templateCode class="perc-region" style="width: 960px"/>
              <region>
                <regionId>temp-region-1</regionId>
                <overridable>true</overridable>
                <templateCode class="perc-region hero" style="height: 300px"/>
              </region>
              <region>
                <regionId>temp-region-2</regionId>
                <templateCode class="perc-region"/>
              </region>
            </region>
            <regionWidgetAssociations>
              <regionWidget>
                <regionId>temp-region-1</regionId>
                <widgetItems>
                  <widgetItem>
                    <id>77</id>
                    <definitionId>percImage</definitionId>
                    <properties><property name="alt">logo</property></properties>
                  </widgetItem>
                </widgetItems>
              </regionWidget>
            </regionWidgetAssociations>
          </regionTree>
        </Template>
    "#};

    #[test]
    fn edited_tree_survives_serialize_and_parse() {
        let (doc, mut tree) = xml::parse_template(TEMPLATE).unwrap();
        let split = tree
            .add_region("temp-region-2", InsertDirection::East)
            .unwrap()
            .unwrap();
        tree.add_widget(Widget::new("90", "percRawHtml"), split.inserted.as_str(), true)
            .unwrap();
        let placeholder = tree.new_widget("percText");
        tree.add_widget(placeholder, split.inserted.as_str(), false)
            .unwrap();
        tree.resize_region("temp-region-1", 120).unwrap();

        let xml = xml::serialize_template(&tree, &doc, PlaceholderIds::Keep).unwrap();
        let (_, reparsed) = xml::parse_template(&xml).unwrap();

        assert_eq!(reparsed.to_string(), tree.to_string());
        let hero = reparsed.find_region("temp-region-1").unwrap();
        assert_eq!(hero.classes(), ["hero".to_owned()]);
        assert_eq!(hero.style().pixels(&page_layout::StyleProperty::Height), Some(120));
        let banner = reparsed.find_widget("77").unwrap();
        assert_eq!(banner.extra().len(), 1);
        assert_eq!(banner.extra()[0].name, "properties");
        assert!(reparsed.validate().is_ok());
    }

    #[test]
    fn unmodelled_document_content_is_preserved() {
        let (doc, tree) = xml::parse_template(TEMPLATE).unwrap();
        let xml = xml::serialize_template(&tree, &doc, PlaceholderIds::Keep).unwrap();
        assert!(xml.starts_with("<?xml"));
        let written = Document::parse(&xml).unwrap();
        assert_eq!(written.root.child_text("name"), Some("Landing & promo"));
        assert!(xml.contains("<property name=\"alt\">logo</property>"));
    }

    #[test]
    fn saved_session_reopens_with_fresh_placeholder_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store.persist_template("101", TEMPLATE).unwrap();

        let mut session = TemplateSession::open(&store, "101").unwrap();
        let widget = session.tree_mut().new_widget("percText");
        let placeholder = widget.id().clone();
        session
            .tree_mut()
            .add_widget(widget, "temp-region-2", true)
            .unwrap();
        session.save(&store, "101").unwrap();

        let stored = store.fetch_template("101").unwrap();
        assert!(!stored.contains(placeholder.as_str()));

        let reopened = TemplateSession::open(&store, "101").unwrap();
        let widgets = reopened
            .tree()
            .find_region("temp-region-2")
            .unwrap()
            .widgets()
            .to_vec();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].definition_id(), "percText");
        assert!(widgets[0].is_placeholder());
    }

    #[test]
    fn failed_reload_keeps_the_current_tree() {
        let mut session = TemplateSession::load(TEMPLATE).unwrap();
        session
            .tree_mut()
            .add_region("temp-region-2", InsertDirection::South)
            .unwrap()
            .unwrap();
        let before = session.tree().to_string();

        let err = session.reload("<Template><id>1</id></Template>").unwrap_err();
        assert!(matches!(err, CodecError::MissingElement { .. }));
        assert_eq!(session.tree().to_string(), before);

        assert!(session.reload("<Template><regionTree>").is_err());
        assert_eq!(session.tree().to_string(), before);

        session.reload(TEMPLATE).unwrap();
        assert_ne!(session.tree().to_string(), before);
    }

    #[test]
    fn opening_a_missing_template_reports_the_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let err = TemplateSession::open(&store, "404").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::NotFound { kind: "template", .. })
        ));
    }

    #[test]
    fn emptied_tree_writes_an_empty_region_tree() {
        let mut session = TemplateSession::load(TEMPLATE).unwrap();
        session.tree_mut().remove_region("container").unwrap().unwrap();
        assert!(session.tree().is_empty());

        let xml = session.to_xml().unwrap();
        let reloaded = TemplateSession::load(&xml).unwrap();
        assert!(reloaded.tree().is_empty());
        assert_eq!(reloaded.tree().to_string(), "(empty)\n");
    }
}
