#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use page_layout::{
        EditMode, InsertDirection, LayoutError, LayoutTree, Orientation, RegionId, Widget,
    };

    fn widget_ids(tree: &LayoutTree, region: &str) -> Vec<String> {
        tree.find_region(region)
            .unwrap()
            .widgets()
            .iter()
            .map(|w| w.id().to_string())
            .collect()
    }

    fn child_ids(tree: &LayoutTree, region: &str) -> Vec<RegionId> {
        tree.find_region(region).unwrap().children().to_vec()
    }

    /// Ids, orientation and widget placement of every region, ignoring flags
    /// and style.
    fn shape(tree: &LayoutTree) -> Vec<(String, Orientation, Vec<String>, Vec<RegionId>)> {
        tree.regions()
            .into_iter()
            .map(|r| {
                (
                    r.id().to_string(),
                    r.orientation(),
                    r.widgets().iter().map(|w| w.id().to_string()).collect(),
                    r.children().to_vec(),
                )
            })
            .collect()
    }

    #[test]
    fn east_split_of_a_leaf_moves_widgets_into_a_carrier() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        tree.add_widget(Widget::new("w1", "percRawHtml"), root.as_str(), true)
            .unwrap();

        let split = tree
            .add_region(root.as_str(), InsertDirection::East)
            .unwrap()
            .unwrap();
        let carrier = split.moved_into.clone().unwrap();

        let root_region = tree.find_region(root.as_str()).unwrap();
        assert_eq!(root_region.orientation(), Orientation::Horizontal);
        assert!(root_region.widgets().is_empty());
        assert_eq!(child_ids(&tree, root.as_str()), vec![carrier.clone(), split.inserted.clone()]);
        assert_eq!(widget_ids(&tree, carrier.as_str()), vec!["w1"]);
        assert!(widget_ids(&tree, split.inserted.as_str()).is_empty());
        assert_eq!(tree.find_region_owning_widget("w1").unwrap().id(), &carrier);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn removing_the_empty_sibling_collapses_widgets_back_into_parent() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        tree.add_widget(Widget::new("wx", "d"), root.as_str(), true)
            .unwrap();
        let split = tree
            .add_region(root.as_str(), InsertDirection::South)
            .unwrap()
            .unwrap();
        let a = split.moved_into.unwrap();

        let removed = tree.remove_region(split.inserted.as_str()).unwrap();
        assert_eq!(removed.map(|r| r.id().clone()), Some(split.inserted));

        let root_region = tree.find_region(root.as_str()).unwrap();
        assert!(root_region.children().is_empty());
        assert_eq!(widget_ids(&tree, root.as_str()), vec!["wx"]);
        assert!(!tree.contains_region(a.as_str()));
        assert_eq!(tree.find_region_owning_widget("wx").unwrap().id(), &root);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn collapse_keeps_container_id_and_takes_survivor_children() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        let first = tree
            .add_region(root.as_str(), InsertDirection::East)
            .unwrap()
            .unwrap();
        let left = first.moved_into.unwrap();
        let right = first.inserted;
        let second = tree
            .add_region(right.as_str(), InsertDirection::South)
            .unwrap()
            .unwrap();
        let grandchildren = child_ids(&tree, right.as_str());
        assert_eq!(grandchildren.len(), 2);
        assert!(grandchildren.contains(&second.inserted));

        tree.remove_region(left.as_str()).unwrap().unwrap();

        assert_eq!(tree.root_id(), Some(&root));
        assert_eq!(child_ids(&tree, root.as_str()), grandchildren);
        assert!(!tree.contains_region(right.as_str()));
        for child in &grandchildren {
            assert_eq!(tree.find_region(child.as_str()).unwrap().parent(), Some(&root));
        }
        assert_eq!(
            tree.find_region(root.as_str()).unwrap().orientation(),
            Orientation::Vertical
        );
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn split_then_remove_restores_structure() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        let split = tree
            .add_region(root.as_str(), InsertDirection::East)
            .unwrap()
            .unwrap();
        let leaf = split.inserted;
        tree.add_widget(Widget::new("w1", "d"), leaf.as_str(), true)
            .unwrap();
        tree.add_widget(Widget::new("w2", "d"), leaf.as_str(), true)
            .unwrap();
        let before = shape(&tree);

        let north = tree
            .add_region(leaf.as_str(), InsertDirection::North)
            .unwrap()
            .unwrap();
        assert_ne!(shape(&tree), before);
        tree.remove_region(north.inserted.as_str()).unwrap().unwrap();

        assert_eq!(shape(&tree), before);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn order_widget_moves_into_front_of_destination() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        tree.add_widget(Widget::new("wx", "d"), root.as_str(), true)
            .unwrap();
        tree.add_widget(Widget::new("wy", "d"), root.as_str(), true)
            .unwrap();
        let split = tree
            .add_region(root.as_str(), InsertDirection::East)
            .unwrap()
            .unwrap();
        let a = split.moved_into.unwrap();
        let b = split.inserted;
        tree.add_widget(Widget::new("wz", "d"), b.as_str(), true)
            .unwrap();

        let placed = tree.order_widget("wx", a.as_str(), b.as_str(), 0).unwrap();
        assert_eq!(placed, Some(0));
        assert_eq!(widget_ids(&tree, a.as_str()), vec!["wy"]);
        assert_eq!(widget_ids(&tree, b.as_str()), vec!["wx", "wz"]);
        assert_eq!(tree.find_region_owning_widget("wx").unwrap().id(), &b);
    }

    #[test]
    fn widgets_cannot_land_on_containers() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        tree.add_region(root.as_str(), InsertDirection::West)
            .unwrap()
            .unwrap();
        let err = tree
            .add_widget(Widget::new("w", "d"), root.as_str(), true)
            .unwrap_err();
        assert_eq!(err, LayoutError::CannotAddWidget(root.clone()));
        assert!(tree.find_widget("w").is_none());
    }

    #[test]
    fn ids_stay_unique_over_many_edits() {
        let mut tree = LayoutTree::new(EditMode::Template);
        tree.create_root();
        let directions = [
            InsertDirection::North,
            InsertDirection::East,
            InsertDirection::South,
            InsertDirection::West,
        ];

        for step in 0..40 {
            let leaves: Vec<RegionId> = tree
                .regions()
                .into_iter()
                .filter(|r| !r.is_container())
                .map(|r| r.id().clone())
                .collect();
            let leaf = &leaves[(step * 7) % leaves.len()];
            if step % 3 == 0 {
                let widget = tree.new_widget("percRawHtml");
                tree.add_widget(widget, leaf.as_str(), step % 2 == 0).unwrap();
            } else {
                tree.add_region(leaf.as_str(), directions[step % 4])
                    .unwrap()
                    .unwrap();
            }
            assert!(tree.validate().is_ok(), "invalid after step {step}");
        }

        let regions: Vec<String> = tree.regions().iter().map(|r| r.id().to_string()).collect();
        let distinct: BTreeSet<&String> = regions.iter().collect();
        assert_eq!(distinct.len(), regions.len());
        assert_eq!(regions.len(), tree.len());

        let widgets: Vec<String> = tree.widgets().iter().map(|w| w.id().to_string()).collect();
        let distinct: BTreeSet<&String> = widgets.iter().collect();
        assert_eq!(distinct.len(), widgets.len());
        assert_eq!(widgets.len(), 14);
    }

    #[test]
    fn stale_ids_are_not_errors() {
        let mut tree = LayoutTree::new(EditMode::Template);
        tree.create_root();
        assert_eq!(tree.add_region("ghost", InsertDirection::North), Ok(None));
        assert_eq!(tree.remove_region("ghost"), Ok(None));
        assert_eq!(tree.remove_widget("ghost"), Ok(None));
        assert_eq!(tree.resize_region("ghost", 100), Ok(None));
    }
}
