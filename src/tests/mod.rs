mod reconcile;
